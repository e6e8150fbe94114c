//! # classroom-dl
//!
//! Backend library that discovers a user's online-classroom courses, stores them,
//! and bulk-downloads their materials into a folder tree that is served as a zip.
//!
//! ## Pipeline
//!
//! - **Classify** raw upstream materials into drive files, videos, links and forms
//! - **Plan** one download item per announcement or coursework posting, each with
//!   a dated target folder
//! - **Download** every item in its own task; binary fetches share a bounded
//!   number of slots while a background refresher keeps the access token valid
//! - **Archive** the folder tree into `<download_root>.zip`, deleted together with
//!   the tree once served
//!
//! ## Quick Start
//!
//! ```no_run
//! use classroom_dl::{ClassroomDownloader, Config, Credential, SessionId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let downloader = ClassroomDownloader::new(config).await?;
//!
//!     let session = SessionId::new("session-cookie-value");
//!     let credential = Credential::new("access-token").with_refresh_token("refresh-token");
//!     downloader.register_session(&session, "user-1", &credential).await?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let courses = downloader.discover_courses(&session).await?;
//!     let ids: Vec<String> = courses.iter().map(|c| c.id.clone()).collect();
//!
//!     let (report, archive) = downloader.download_archive(&session, &ids).await?;
//!     println!("{} items failed, archive at {}", report.items_failed, archive.path().display());
//!     // dropping `archive` deletes the zip and the downloaded tree
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Zip archive creation and cleanup
pub mod archive;
/// Material classification
pub mod classifier;
/// Configuration types
pub mod config;
/// Access credentials and background renewal
pub mod credentials;
/// Database persistence layer
pub mod db;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Download-item planning
pub mod planner;
/// Upstream course, content and file-id providers
pub mod provider;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use archive::PreparedArchive;
pub use classifier::classify;
pub use config::{Config, FolderNaming};
pub use credentials::{CredentialStore, SharedCredential, TokenRefresher};
pub use db::Database;
pub use downloader::{BatchScheduler, ClassroomDownloader, Providers};
pub use error::{
    ApiError, ArchiveError, CredentialError, DatabaseError, DownloadError, Error, ErrorDetail,
    Result, ToHttpStatus,
};
pub use planner::plan;
pub use provider::{ContentProvider, CourseProvider, FileIdResolver};
pub use types::{
    BatchReport, ContentItem, ContentKind, Course, Credential, DownloadItem, Event, ItemFailure,
    Material, MaterialDetail, MaterialKind, RawMaterial, SessionId,
};
