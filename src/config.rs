//! Configuration types for classroom-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Download behavior configuration (target folder, concurrency, folder naming)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Root folder that receives one sub-folder per course (default: "./downloads/classroom-dl")
    ///
    /// The archive of a batch is written next to it as `<download_root>.zip`.
    #[serde(default = "default_download_root")]
    pub download_root: PathBuf,

    /// Maximum number of simultaneous binary file fetches (default: 5)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// How content-item folders are named inside a course folder
    #[serde(default)]
    pub folder_naming: FolderNaming,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_root: default_download_root(),
            max_concurrent_downloads: default_max_concurrent(),
            folder_naming: FolderNaming::default(),
        }
    }
}

/// Naming scheme for the per-content-item folders
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderNaming {
    /// `DD-MM-YYYY` of the creation time; items created on the same day share a folder
    #[default]
    ByDate,
    /// `DD-MM-YYYY_<item id>`; every content item gets its own folder
    ByDateAndId,
}

/// OAuth client settings used to renew access tokens during a batch
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// OAuth client id
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret
    #[serde(default)]
    pub client_secret: String,

    /// Token endpoint used for the refresh-token grant
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Interval between background token refreshes while a batch runs (default: 20 minutes)
    #[serde(default = "default_refresh_interval", with = "duration_serde")]
    pub refresh_interval: Duration,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            token_url: default_token_url(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

/// Upstream API endpoints
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the classroom API (default: "https://classroom.googleapis.com/v1")
    #[serde(default = "default_classroom_base_url")]
    pub classroom_base_url: String,

    /// Base URL of the drive API (default: "https://www.googleapis.com/drive/v2")
    #[serde(default = "default_drive_base_url")]
    pub drive_base_url: String,

    /// Page size requested from paginated classroom endpoints (default: 50)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Number of courses whose contents are fetched concurrently during discovery (default: 4)
    #[serde(default = "default_discovery_concurrency")]
    pub discovery_concurrency: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            classroom_base_url: default_classroom_base_url(),
            drive_base_url: default_drive_base_url(),
            page_size: default_page_size(),
            discovery_concurrency: default_discovery_concurrency(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database path (default: "./classroom-dl.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Main configuration for [`ClassroomDownloader`](crate::ClassroomDownloader)
///
/// Fields are organized into sub-configs:
/// - [`download`](DownloadConfig): target folder, concurrency, folder naming
/// - [`oauth`](OAuthConfig): token refresh
/// - [`provider`](ProviderConfig): upstream endpoints
/// - [`persistence`](PersistenceConfig): database location
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// OAuth client settings
    #[serde(default)]
    pub oauth: OAuthConfig,

    /// Upstream API endpoints
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Data storage
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Config {
    /// Build a configuration from the process environment, loading `.env` first if present.
    ///
    /// `MAX_CONCURRENT_DOWNLOADS` is required; every other variable falls back to its default.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "no .env file loaded");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        let max_concurrent = lookup("MAX_CONCURRENT_DOWNLOADS").ok_or_else(|| {
            Error::config(
                "max_concurrent_downloads",
                "MAX_CONCURRENT_DOWNLOADS is not set",
            )
        })?;
        config.download.max_concurrent_downloads =
            max_concurrent.trim().parse().map_err(|e| {
                Error::config(
                    "max_concurrent_downloads",
                    format!("MAX_CONCURRENT_DOWNLOADS is not a number: {e}"),
                )
            })?;

        if let Some(root) = lookup("DOWNLOAD_ROOT") {
            config.download.download_root = PathBuf::from(root);
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            config.persistence.database_path = PathBuf::from(path);
        }
        if let Some(id) = lookup("OAUTH_CLIENT_ID") {
            config.oauth.client_id = id;
        }
        if let Some(secret) = lookup("OAUTH_CLIENT_SECRET") {
            config.oauth.client_secret = secret;
        }
        if let Some(url) = lookup("OAUTH_TOKEN_URL") {
            config.oauth.token_url = url;
        }
        if let Some(secs) = lookup("TOKEN_REFRESH_INTERVAL_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                Error::config(
                    "refresh_interval",
                    format!("TOKEN_REFRESH_INTERVAL_SECS is not a number: {e}"),
                )
            })?;
            config.oauth.refresh_interval = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check settings that would make every batch fail before it starts.
    pub fn validate(&self) -> Result<()> {
        if self.download.max_concurrent_downloads == 0 {
            return Err(Error::config(
                "max_concurrent_downloads",
                "max_concurrent_downloads must be at least 1",
            ));
        }
        if self.download.download_root.as_os_str().is_empty() {
            return Err(Error::config("download_root", "download_root is empty"));
        }
        if self.oauth.refresh_interval.is_zero() {
            return Err(Error::config(
                "refresh_interval",
                "refresh_interval must be greater than zero",
            ));
        }
        if self.provider.discovery_concurrency == 0 {
            return Err(Error::config(
                "discovery_concurrency",
                "discovery_concurrency must be at least 1",
            ));
        }
        Ok(())
    }

    /// Path of the archive produced for the download root
    pub fn archive_path(&self) -> PathBuf {
        crate::archive::archive_path_for(&self.download.download_root)
    }
}

fn default_download_root() -> PathBuf {
    PathBuf::from("./downloads/classroom-dl")
}

fn default_max_concurrent() -> usize {
    5
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(20 * 60)
}

fn default_classroom_base_url() -> String {
    "https://classroom.googleapis.com/v1".to_string()
}

fn default_drive_base_url() -> String {
    "https://www.googleapis.com/drive/v2".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_discovery_concurrency() -> usize {
    4
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./classroom-dl.db")
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
