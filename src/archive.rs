//! Zip archive creation for downloaded course trees
//!
//! The archive of a folder `root` is always written to the sibling path
//! `root.zip`. [`PreparedArchive`] owns both the archive and the folder it was
//! built from and removes them when dropped.

use crate::error::{ArchiveError, Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Sibling archive path of a folder: `<root>.zip`
pub fn archive_path_for(root: &Path) -> PathBuf {
    // Collecting components drops a trailing separator
    let normalized: PathBuf = root.components().collect();
    let mut name = normalized.into_os_string();
    name.push(".zip");
    PathBuf::from(name)
}

/// Zip every regular file below `source_root` into `<source_root>.zip`
///
/// Entries are stored relative to `source_root` with forward slashes, in
/// sorted walk order. Directories are not stored. Fails without creating an
/// archive when the folder is absent or holds no regular files, and removes a
/// partially written archive on any later failure.
pub fn zip_folder(source_root: &Path) -> Result<PathBuf> {
    if !source_root.is_dir() {
        return Err(Error::Archive(ArchiveError::SourceMissing {
            path: source_root.to_path_buf(),
        }));
    }

    let archive_path = archive_path_for(source_root);
    let files = collect_files(source_root, &archive_path)?;
    if files.is_empty() {
        return Err(Error::Archive(ArchiveError::EmptySource {
            path: source_root.to_path_buf(),
        }));
    }

    debug!(?source_root, ?archive_path, files = files.len(), "writing archive");

    if let Err(e) = write_archive(source_root, &files, &archive_path) {
        remove_partial_archive(&archive_path);
        return Err(e);
    }

    info!(?archive_path, files = files.len(), "archive created");
    Ok(archive_path)
}

/// Async wrapper around [`zip_folder`] that runs on the blocking pool
pub async fn create_archive(source_root: PathBuf) -> Result<PathBuf> {
    let archive_path = archive_path_for(&source_root);
    tokio::task::spawn_blocking(move || zip_folder(&source_root))
        .await
        .map_err(|e| {
            Error::Archive(ArchiveError::WriteFailed {
                archive: archive_path,
                reason: format!("archive task failed: {}", e),
            })
        })?
}

fn collect_files(source_root: &Path, archive_path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(source_root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            Error::Archive(ArchiveError::WriteFailed {
                archive: archive_path.to_path_buf(),
                reason: format!("failed to walk {}: {}", source_root.display(), e),
            })
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn entry_name(source_root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(source_root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(parts.join("/"))
}

fn write_archive(source_root: &Path, files: &[PathBuf], archive_path: &Path) -> Result<()> {
    let write_failed = |reason: String| {
        Error::Archive(ArchiveError::WriteFailed {
            archive: archive_path.to_path_buf(),
            reason,
        })
    };

    let out = std::fs::File::create(archive_path)
        .map_err(|e| write_failed(format!("failed to create archive file: {}", e)))?;
    let mut writer = zip::ZipWriter::new(out);
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for file in files {
        let Some(name) = entry_name(source_root, file) else {
            warn!(?file, "skipping file outside archive source");
            continue;
        };

        writer
            .start_file(name.as_str(), options)
            .map_err(|e| write_failed(format!("failed to start entry {}: {}", name, e)))?;
        let mut input = std::fs::File::open(file)
            .map_err(|e| write_failed(format!("failed to open {}: {}", file.display(), e)))?;
        std::io::copy(&mut input, &mut writer)
            .map_err(|e| write_failed(format!("failed to write entry {}: {}", name, e)))?;
    }

    let mut out = writer
        .finish()
        .map_err(|e| write_failed(format!("failed to finish archive: {}", e)))?;
    out.flush()
        .map_err(|e| write_failed(format!("failed to flush archive: {}", e)))?;
    Ok(())
}

fn remove_partial_archive(archive_path: &Path) {
    if archive_path.is_file()
        && let Err(e) = std::fs::remove_file(archive_path)
    {
        warn!(?archive_path, error = %e, "failed to remove partial archive");
    }
}

/// An archive ready to be served, deleted together with its source folder on drop
#[derive(Debug)]
pub struct PreparedArchive {
    archive: PathBuf,
    source_root: PathBuf,
}

impl PreparedArchive {
    /// Zip `source_root` and take ownership of both the archive and the folder
    pub async fn create(source_root: PathBuf) -> Result<Self> {
        let archive = create_archive(source_root.clone()).await?;
        Ok(Self {
            archive,
            source_root,
        })
    }

    /// Location of the archive
    pub fn path(&self) -> &Path {
        &self.archive
    }

    /// Folder the archive was built from
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Size of the archive in bytes
    pub async fn size(&self) -> Result<u64> {
        Ok(tokio::fs::metadata(&self.archive).await?.len())
    }

    /// Read the whole archive into memory
    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.archive).await?)
    }
}

impl Drop for PreparedArchive {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.archive)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(archive = ?self.archive, error = %e, "failed to remove served archive");
        }
        if let Err(e) = std::fs::remove_dir_all(&self.source_root)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(source_root = ?self.source_root, error = %e, "failed to remove download folder");
        }
        debug!(archive = ?self.archive, "served archive cleaned up");
    }
}
