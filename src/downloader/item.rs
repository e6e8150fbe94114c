//! Execution of a single download item.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::credentials::SharedCredential;
use crate::error::{DownloadError, Error, Result};
use crate::provider::{ContentProvider, FileIdResolver};
use crate::types::{DownloadItem, Material, MaterialDetail};
use crate::utils::{
    LINKS_FILE_NAME, TEXT_FILE_NAME, append_line, drive_file_name, sanitize_filename,
};

/// Shared handles every item task needs
#[derive(Clone)]
pub(crate) struct ItemContext {
    /// Binary content source
    pub content: Arc<dyn ContentProvider>,
    /// Drive file-id lookup
    pub resolver: Arc<dyn FileIdResolver>,
    /// Gate around binary fetches
    pub fetch_slots: Arc<Semaphore>,
    /// Batch credential, read per request
    pub credential: SharedCredential,
}

/// What one item produced
#[derive(Debug, Default)]
pub(crate) struct ItemOutcome {
    /// Binary files written
    pub files_downloaded: usize,
    /// Link lines appended
    pub links_saved: usize,
    /// Every step that failed, in order
    pub errors: Vec<String>,
}

/// Create the item folder, append its text, then process its materials one by one.
///
/// Failures are recorded in the outcome; a failed material does not stop the
/// remaining materials of the item.
pub(crate) async fn process_item(ctx: ItemContext, item: DownloadItem) -> ItemOutcome {
    let mut outcome = ItemOutcome::default();
    let folder = item.folder_path.as_path();

    if let Err(e) = tokio::fs::create_dir_all(folder).await {
        tracing::error!(?folder, error = %e, "failed to create item folder");
        outcome
            .errors
            .push(format!("failed to create folder {}: {}", folder.display(), e));
        return outcome;
    }

    if !item.text.is_empty()
        && let Err(e) = append_line(&folder.join(TEXT_FILE_NAME), &item.text).await
    {
        tracing::error!(?folder, error = %e, "failed to write item text");
        outcome.errors.push(format!("failed to write text: {}", e));
    }

    for material in &item.materials {
        match &material.detail {
            MaterialDetail::Link { .. } | MaterialDetail::YoutubeVideo { .. } => {
                match append_line(&folder.join(LINKS_FILE_NAME), &material.url).await {
                    Ok(()) => outcome.links_saved += 1,
                    Err(e) => {
                        tracing::error!(?folder, url = %material.url, error = %e, "failed to save link");
                        outcome
                            .errors
                            .push(format!("failed to save link {}: {}", material.url, e));
                    }
                }
            }
            MaterialDetail::DriveFile { .. } => match fetch_drive_file(&ctx, folder, material).await
            {
                Ok(bytes) => {
                    tracing::debug!(?folder, title = %material.title, bytes, "drive file saved");
                    outcome.files_downloaded += 1;
                }
                Err(e) => {
                    tracing::error!(?folder, title = %material.title, error = %e, "drive file download failed");
                    outcome
                        .errors
                        .push(format!("failed to download {}: {}", material.title, e));
                }
            },
            MaterialDetail::Form { .. } => {
                tracing::debug!(title = %material.title, "skipping form material");
            }
        }
    }

    outcome
}

async fn fetch_drive_file(ctx: &ItemContext, folder: &Path, material: &Material) -> Result<u64> {
    // Released on drop, whether the fetch succeeds or not
    let _permit = ctx.fetch_slots.acquire().await.map_err(|e| {
        Error::Download(DownloadError::TaskAborted {
            reason: format!("fetch slots closed: {}", e),
        })
    })?;

    let file_id = resolve_file_id(ctx.resolver.as_ref(), material).await?;
    let access_token = ctx.credential.access_token().await;
    let dest = folder.join(drive_file_name(&material.title, &file_id));

    ctx.content
        .download_file(&access_token, &file_id, &dest)
        .await
}

/// Stored id of the material, then any stored drive file with the same title,
/// then the id carried by the material itself.
async fn resolve_file_id(resolver: &dyn FileIdResolver, material: &Material) -> Result<String> {
    if let Some(id) = resolver.file_id_for_material(material).await? {
        return Ok(id);
    }
    if let Some(id) = resolver
        .file_id_by_title(&sanitize_filename(&material.title))
        .await?
    {
        return Ok(id);
    }
    if let Some(id) = material.detail.remote_id()
        && !id.is_empty()
    {
        return Ok(id.to_string());
    }
    Err(Error::Download(DownloadError::FileIdNotFound {
        title: material.title.clone(),
    }))
}
