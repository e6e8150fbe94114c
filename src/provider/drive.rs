//! Binary content download from the drive API.

use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::ContentProvider;
use crate::error::{DownloadError, Error, Result};

/// [`ContentProvider`] backed by the drive REST API (`files/{id}?alt=media`)
pub struct DriveClient {
    client: reqwest::Client,
    base_url: String,
}

impl DriveClient {
    /// Create a client for the drive API rooted at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client that reuses an existing HTTP client
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn media_url(&self, file_id: &str) -> String {
        format!(
            "{}/files/{}?alt=media",
            self.base_url,
            urlencoding::encode(file_id)
        )
    }
}

#[async_trait]
impl ContentProvider for DriveClient {
    async fn download_file(&self, access_token: &str, file_id: &str, dest: &Path) -> Result<u64> {
        let mut response = self
            .client
            .get(self.media_url(file_id))
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Download(DownloadError::FetchFailed {
                file_id: file_id.to_string(),
                status: status.as_u16(),
            }));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;

        let copied: Result<()> = async {
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = copied {
            drop(file);
            if let Err(remove_err) = tokio::fs::remove_file(dest).await {
                tracing::warn!(?dest, error = %remove_err, "failed to remove partial download");
            }
            return Err(e);
        }

        tracing::debug!(file_id, ?dest, bytes = written, "drive file downloaded");
        Ok(written)
    }
}
