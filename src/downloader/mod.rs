//! Core downloader implementation split into focused submodules.
//!
//! The `ClassroomDownloader` struct and its methods are organized by domain:
//! - [`discovery`] - Course discovery and listing
//! - [`batch`] - Download batches with a bound credential refresher
//! - [`serve`] - Archive preparation for serving
//! - [`scheduler`] - Bounded per-item task scheduling
//! - [`item`] - Execution of a single download item

mod batch;
mod discovery;
mod item;
mod scheduler;
mod serve;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use scheduler::BatchScheduler;

use std::sync::Arc;

use crate::config::Config;
use crate::credentials::{OAuthTokenRefresher, TokenRefresher};
use crate::db::Database;
use crate::error::Result;
use crate::provider::{ClassroomClient, ContentProvider, CourseProvider, DriveClient};
use crate::types::{Credential, Event, SessionId};

/// Buffer size of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Upstream collaborators used by the downloader
#[derive(Clone)]
pub struct Providers {
    /// Course discovery
    pub courses: Arc<dyn CourseProvider>,
    /// Binary file content
    pub content: Arc<dyn ContentProvider>,
    /// Access-token renewal
    pub token_refresher: Arc<dyn TokenRefresher>,
}

impl Providers {
    /// HTTP providers for the classroom API, the drive API and the OAuth token endpoint
    pub fn http(config: &Config) -> Self {
        let client = reqwest::Client::new();
        Self {
            courses: Arc::new(ClassroomClient::with_client(client.clone(), &config.provider)),
            content: Arc::new(DriveClient::with_client(
                client.clone(),
                config.provider.drive_base_url.clone(),
            )),
            token_refresher: Arc::new(OAuthTokenRefresher::with_client(
                client,
                config.oauth.clone(),
            )),
        }
    }
}

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct ClassroomDownloader {
    /// Database instance for persistence (wrapped in Arc for sharing across tasks)
    pub db: Arc<Database>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Upstream providers
    pub(crate) providers: Providers,
}

impl ClassroomDownloader {
    /// Create a downloader talking to the real upstream APIs
    ///
    /// Validates the configuration, then opens (and migrates) the database.
    pub async fn new(config: Config) -> Result<Self> {
        let providers = Providers::http(&config);
        Self::with_providers(config, providers).await
    }

    /// Create a downloader with custom upstream providers
    pub async fn with_providers(config: Config, providers: Providers) -> Result<Self> {
        config.validate()?;

        let db = Database::new(&config.persistence.database_path).await?;
        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tracing::info!(
            download_root = ?config.download.download_root,
            max_concurrent_downloads = config.download.max_concurrent_downloads,
            "classroom downloader ready"
        );

        Ok(Self {
            db: Arc::new(db),
            event_tx,
            config: Arc::new(config),
            providers,
        })
    }

    /// Subscribe to downloader events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Store the credential obtained for a session after sign-in
    pub async fn register_session(
        &self,
        session: &SessionId,
        user_id: &str,
        credential: &Credential,
    ) -> Result<()> {
        self.db.save_session(session, user_id, credential).await?;
        tracing::info!(session = %session, user_id, "session registered");
        Ok(())
    }

    /// Forget a session and its credential
    pub async fn end_session(&self, session: &SessionId) -> Result<()> {
        if !self.db.delete_session(session).await? {
            tracing::debug!(session = %session, "session already gone");
        }
        Ok(())
    }

    pub(crate) fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
