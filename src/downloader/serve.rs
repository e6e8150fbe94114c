//! Archive preparation for serving a finished batch.

use super::ClassroomDownloader;
use crate::archive::PreparedArchive;
use crate::error::Result;
use crate::types::{BatchReport, Event, SessionId};

impl ClassroomDownloader {
    /// Zip the download root into `<download_root>.zip`
    ///
    /// The returned archive deletes itself and the download root when dropped.
    /// On failure the download root is deleted right away and no archive remains.
    pub async fn prepare_archive(&self) -> Result<PreparedArchive> {
        let root = self.config.download.download_root.clone();

        match PreparedArchive::create(root.clone()).await {
            Ok(archive) => {
                self.emit(Event::ArchiveReady {
                    path: archive.path().to_path_buf(),
                });
                Ok(archive)
            }
            Err(e) => {
                tracing::error!(?root, error = %e, "archiving failed");
                if let Err(remove_err) = tokio::fs::remove_dir_all(&root).await
                    && remove_err.kind() != std::io::ErrorKind::NotFound
                {
                    tracing::warn!(?root, error = %remove_err, "failed to remove download folder");
                }
                Err(e)
            }
        }
    }

    /// Download the selected courses and archive the result in one step
    ///
    /// Items that failed are listed in the report; whatever was downloaded is archived.
    pub async fn download_archive(
        &self,
        session: &SessionId,
        course_ids: &[String],
    ) -> Result<(BatchReport, PreparedArchive)> {
        let report = self.download_courses(session, course_ids).await?;
        let archive = self.prepare_archive().await?;
        Ok((report, archive))
    }
}
