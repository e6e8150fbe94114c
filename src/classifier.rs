//! Material classification
//!
//! Upstream material records carry up to four optional sub-payloads. [`classify`]
//! picks the one that wins and derives the sanitized title and URL used by the
//! download pipeline.
//!
//! Precedence when several payloads are present: drive file, then video, then
//! link, then form. A payload only counts when its identifying field (drive id,
//! video id, link URL, form URL) is non-empty.

use crate::types::{Material, MaterialDetail, RawMaterial};
use crate::utils::sanitize_filename;

/// Classify a raw material record
///
/// Returns `None` when no sub-payload carries an identifier; callers skip such
/// materials.
pub fn classify(raw: &RawMaterial) -> Option<Material> {
    let detail = select_detail(raw)?;

    let (upstream_title, identifier) = match &detail {
        MaterialDetail::DriveFile {
            remote_id, title, ..
        }
        | MaterialDetail::YoutubeVideo {
            remote_id, title, ..
        } => (title.as_str(), remote_id.as_str()),
        MaterialDetail::Link { url, title } => (title.as_str(), url.as_str()),
        MaterialDetail::Form { form_url, title } => (title.as_str(), form_url.as_str()),
    };

    let mut title = sanitize_filename(upstream_title);
    if title.is_empty() {
        title = sanitize_filename(identifier);
    }
    if title.is_empty() {
        // identifiers made only of dots/spaces
        title = detail.kind().as_str().to_string();
    }

    let url = match &detail {
        MaterialDetail::DriveFile { link, .. } | MaterialDetail::YoutubeVideo { link, .. } => {
            link.clone()
        }
        MaterialDetail::Link { url, .. } => url.clone(),
        MaterialDetail::Form { form_url, .. } => form_url.clone(),
    };

    Some(Material {
        id: None,
        title,
        url,
        detail,
    })
}

/// Classify every material, dropping those without a usable payload
pub fn classify_all<'a>(raws: impl IntoIterator<Item = &'a RawMaterial>) -> Vec<Material> {
    raws.into_iter()
        .filter_map(|raw| {
            let material = classify(raw);
            if material.is_none() {
                tracing::debug!(?raw, "skipping material without a usable payload");
            }
            material
        })
        .collect()
}

fn select_detail(raw: &RawMaterial) -> Option<MaterialDetail> {
    if let Some(shared) = &raw.drive_file
        && !shared.drive_file.id.is_empty()
    {
        let file = &shared.drive_file;
        let link = if file.alternate_link.is_empty() {
            drive_viewer_url(&file.id)
        } else {
            file.alternate_link.clone()
        };
        return Some(MaterialDetail::DriveFile {
            remote_id: file.id.clone(),
            title: file.title.clone(),
            link,
        });
    }

    if let Some(video) = &raw.youtube_video
        && !video.id.is_empty()
    {
        let link = if video.alternate_link.is_empty() {
            youtube_watch_url(&video.id)
        } else {
            video.alternate_link.clone()
        };
        return Some(MaterialDetail::YoutubeVideo {
            remote_id: video.id.clone(),
            title: video.title.clone(),
            link,
        });
    }

    if let Some(link) = &raw.link
        && !link.url.is_empty()
    {
        return Some(MaterialDetail::Link {
            url: link.url.clone(),
            title: link.title.clone(),
        });
    }

    if let Some(form) = &raw.form
        && !form.form_url.is_empty()
    {
        return Some(MaterialDetail::Form {
            form_url: form.form_url.clone(),
            title: form.title.clone(),
        });
    }

    None
}

fn drive_viewer_url(file_id: &str) -> String {
    format!(
        "https://drive.google.com/file/d/{}/view",
        urlencoding::encode(file_id)
    )
}

fn youtube_watch_url(video_id: &str) -> String {
    format!(
        "https://www.youtube.com/watch?v={}",
        urlencoding::encode(video_id)
    )
}
