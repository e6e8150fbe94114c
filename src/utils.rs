//! Utility functions for file names and folder layout

use chrono::{DateTime, Utc};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// File inside a content-item folder that collects body texts
pub const TEXT_FILE_NAME: &str = "Announcement.txt";

/// File inside a content-item folder that collects link and video URLs
pub const LINKS_FILE_NAME: &str = "links.txt";

/// Characters that are not allowed in file and folder names on common filesystems
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '\'', '/', '\\', '|', '?', '*'];

/// Make a title safe to use as a single file or folder name
///
/// Every character in `< > : " ' / \ | ? *` becomes `_`, then leading and
/// trailing whitespace and dots are trimmed. The result may be empty.
///
/// # Examples
///
/// ```
/// use classroom_dl::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("  Week 1: intro/notes?.pdf "), "Week 1_ intro_notes_.pdf");
/// assert_eq!(sanitize_filename("..hidden.."), "hidden");
/// ```
pub fn sanitize_filename(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .collect();
    replaced
        .trim_matches(|c: char| c.is_whitespace() || c == '.')
        .to_string()
}

/// Name of the file a drive download is written to inside an item folder
///
/// The title is sanitized into a single path component. An empty result falls
/// back to the sanitized file id, then to `"file"`. Names that would clash with
/// [`TEXT_FILE_NAME`] or [`LINKS_FILE_NAME`] get a `drive_` prefix.
///
/// # Examples
///
/// ```
/// use classroom_dl::utils::drive_file_name;
///
/// assert_eq!(drive_file_name("../../notes.pdf", "f1"), "_.._notes.pdf");
/// assert_eq!(drive_file_name("..", "f1"), "f1");
/// assert_eq!(drive_file_name("links.txt", "f1"), "drive_links.txt");
/// ```
pub fn drive_file_name(title: &str, file_id: &str) -> String {
    let mut name = sanitize_filename(title);
    if name.is_empty() {
        name = sanitize_filename(file_id);
    }
    if name.is_empty() {
        name = "file".to_string();
    }
    if name.eq_ignore_ascii_case(TEXT_FILE_NAME) || name.eq_ignore_ascii_case(LINKS_FILE_NAME) {
        name = format!("drive_{}", name);
    }
    name
}

/// Folder name for a content item created at `time`, formatted `DD-MM-YYYY`
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use classroom_dl::utils::date_folder;
///
/// let time = Utc.with_ymd_and_hms(2024, 3, 7, 15, 30, 0).unwrap();
/// assert_eq!(date_folder(&time), "07-03-2024");
/// ```
pub fn date_folder(time: &DateTime<Utc>) -> String {
    time.format("%d-%m-%Y").to_string()
}

/// Append `line` followed by a newline to `path`, creating the file if needed
pub async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');
    // One write per line keeps concurrent appends from interleaving mid-line
    file.write_all(&buf).await?;
    file.flush().await
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn sanitize_replaces_every_forbidden_character() {
        let sanitized = sanitize_filename(r#"a<b>c:d"e'f/g\h|i?j*k"#);
        assert_eq!(sanitized, "a_b_c_d_e_f_g_h_i_j_k");
        assert!(!sanitized.contains(FORBIDDEN_CHARS));
    }

    #[test]
    fn sanitize_trims_spaces_and_dots_at_both_ends() {
        assert_eq!(sanitize_filename(" . report.v2.pdf . "), "report.v2.pdf");
        assert_eq!(sanitize_filename("\tnotes\n"), "notes");
    }

    #[test]
    fn sanitize_keeps_inner_spaces_and_unicode() {
        assert_eq!(sanitize_filename("Álgebra  Lineal"), "Álgebra  Lineal");
    }

    #[test]
    fn sanitize_can_produce_empty_name() {
        assert_eq!(sanitize_filename(" ... "), "");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn sanitize_output_never_has_forbidden_or_edge_characters() {
        let inputs = [
            "?leading",
            "trailing*",
            " . ?mixed: / case . ",
            "..",
            "plain",
            "\"quoted\"",
        ];
        for input in inputs {
            let out = sanitize_filename(input);
            assert!(!out.contains(FORBIDDEN_CHARS), "{input:?} -> {out:?}");
            assert!(!out.starts_with([' ', '.']), "{input:?} -> {out:?}");
            assert!(!out.ends_with([' ', '.']), "{input:?} -> {out:?}");
        }
    }

    #[test]
    fn drive_file_name_is_a_single_component() {
        for title in ["../../escaped.bin", "/abs/path", "a/../../b", "C:\\temp\\x"] {
            let name = drive_file_name(title, "f1");
            assert_eq!(Path::new(&name).components().count(), 1, "{title} -> {name}");
            assert!(!name.starts_with('.'), "{title} -> {name}");
        }
    }

    #[test]
    fn drive_file_name_falls_back_when_title_is_empty() {
        assert_eq!(drive_file_name(" . ", "abc"), "abc");
        assert_eq!(drive_file_name("", "/"), "_");
        assert_eq!(drive_file_name("", ""), "file");
    }

    #[test]
    fn drive_file_name_avoids_text_and_links_files() {
        assert_eq!(drive_file_name("Announcement.txt", "f"), "drive_Announcement.txt");
        assert_eq!(drive_file_name("LINKS.TXT", "f"), "drive_LINKS.TXT");
        assert_eq!(drive_file_name("notes.txt", "f"), "notes.txt");
    }

    #[test]
    fn date_folder_is_day_month_year() {
        let time = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(date_folder(&time), "31-12-2023");
    }

    #[tokio::test]
    async fn append_line_creates_then_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LINKS_FILE_NAME);

        append_line(&path, "https://a.example").await.unwrap();
        append_line(&path, "https://b.example").await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "https://a.example\nhttps://b.example\n");
    }
}
