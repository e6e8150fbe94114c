//! Download batches.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::ClassroomDownloader;
use super::scheduler::BatchScheduler;
use crate::credentials::{
    CredentialRefresherParams, CredentialStore, SharedCredential, spawn_credential_refresher,
};
use crate::error::{Error, Result};
use crate::planner::plan_all;
use crate::types::{BatchReport, Event, SessionId};

impl ClassroomDownloader {
    /// Download the materials of the selected courses into the download root
    ///
    /// Every course must be stored and owned by the session's user. Per-item
    /// failures are recorded in the returned report; configuration problems and
    /// unknown courses fail the whole call before any download starts.
    pub async fn download_courses(
        &self,
        session: &SessionId,
        course_ids: &[String],
    ) -> Result<BatchReport> {
        let scheduler = BatchScheduler::new(
            self.providers.content.clone(),
            self.db.clone(),
            self.config.download.max_concurrent_downloads,
        )?
        .with_events(self.event_tx.clone());

        let root = &self.config.download.download_root;
        tokio::fs::create_dir_all(root).await.map_err(|e| {
            Error::config(
                "download_root",
                format!("download root {} is unusable: {}", root.display(), e),
            )
        })?;

        let user_id = self.db.user_for_session(session).await?;
        let courses: Vec<_> = self
            .db
            .get_courses_by_ids(course_ids)
            .await?
            .into_iter()
            .filter(|c| c.user_id == user_id)
            .collect();

        let missing: Vec<&str> = course_ids
            .iter()
            .filter(|id| !courses.iter().any(|c| &c.id == *id))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(Error::NotFound(format!(
                "courses not found: {}",
                missing.join(", ")
            )));
        }

        let items = plan_all(&courses, root, self.config.download.folder_naming);
        let credential = SharedCredential::new(self.db.credential(session).await?);

        tracing::info!(
            session = %session,
            courses = courses.len(),
            items = items.len(),
            "starting download batch"
        );
        self.emit(Event::BatchStarted { items: items.len() });

        let refresher = spawn_credential_refresher(CredentialRefresherParams {
            session: session.clone(),
            credential: credential.clone(),
            refresher: self.providers.token_refresher.clone(),
            store: self.db.clone() as Arc<dyn CredentialStore>,
            interval: self.config.oauth.refresh_interval,
            event_tx: self.event_tx.clone(),
            cancel_token: CancellationToken::new(),
        });

        let report = scheduler.run(items, credential).await;
        refresher.stop().await;

        self.emit(Event::BatchComplete {
            succeeded: report.items_succeeded,
            failed: report.items_failed,
        });

        Ok(report)
    }
}
