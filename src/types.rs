//! Core types for classroom-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{DownloadError, Error, Result};

/// Opaque key identifying an authenticated session in the credential store
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Create a new SessionId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Access/refresh token pair used against the upstream providers
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token sent with every upstream request
    pub access_token: String,
    /// Token exchanged for a new access token when the current one expires
    pub refresh_token: Option<String>,
    /// When the access token stops being accepted
    pub expiry: Option<DateTime<Utc>>,
}

impl Credential {
    /// Create a credential from an access token alone
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expiry: None,
        }
    }

    /// Attach a refresh token
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }
}

// Tokens never end up in logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// A course with its announcements and coursework, in upstream order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Upstream course identifier
    pub id: String,
    /// Display name, used (sanitized) as the course folder name
    pub name: String,
    /// Optional section label
    #[serde(default)]
    pub section: Option<String>,
    /// User that owns the stored copy of this course
    pub user_id: String,
    /// Announcements, oldest first as delivered upstream
    #[serde(default)]
    pub announcements: Vec<ContentItem>,
    /// Coursework materials, as delivered upstream
    #[serde(default)]
    pub coursework: Vec<ContentItem>,
}

/// Which collection a content item belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Stream announcement
    Announcement,
    /// Coursework material posting
    Coursework,
}

impl ContentKind {
    /// Convert to integer for database storage
    pub fn to_i32(self) -> i32 {
        match self {
            ContentKind::Announcement => 0,
            ContentKind::Coursework => 1,
        }
    }

    /// Convert from database integer, unknown values read as coursework
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => ContentKind::Announcement,
            _ => ContentKind::Coursework,
        }
    }
}

/// An announcement or coursework posting carrying attached materials
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Upstream identifier
    pub id: String,
    /// Announcement or coursework
    pub kind: ContentKind,
    /// Body text (may be empty)
    #[serde(default)]
    pub text: String,
    /// Creation timestamp, decides the dated folder
    pub creation_time: DateTime<Utc>,
    /// Classified materials in upstream order
    #[serde(default)]
    pub materials: Vec<Material>,
}

/// Concrete kind of a classified material
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    /// File stored in the cloud drive, downloaded as binary content
    #[serde(rename = "driveFile")]
    DriveFile,
    /// Embedded video, saved as a link
    #[serde(rename = "youtubeVideo")]
    YoutubeVideo,
    /// Plain link, saved as a link
    #[serde(rename = "link")]
    Link,
    /// Form, not downloaded
    #[serde(rename = "form")]
    Form,
}

impl MaterialKind {
    /// Stable string used in storage and logs
    pub fn as_str(self) -> &'static str {
        match self {
            MaterialKind::DriveFile => "driveFile",
            MaterialKind::YoutubeVideo => "youtubeVideo",
            MaterialKind::Link => "link",
            MaterialKind::Form => "form",
        }
    }
}

impl std::fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MaterialKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "driveFile" => Ok(MaterialKind::DriveFile),
            "youtubeVideo" => Ok(MaterialKind::YoutubeVideo),
            "link" => Ok(MaterialKind::Link),
            "form" => Ok(MaterialKind::Form),
            other => Err(Error::Other(format!("unknown material kind: {other}"))),
        }
    }
}

/// The populated variant of a material
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialDetail {
    /// Cloud drive file
    DriveFile {
        /// Provider-side file id
        remote_id: String,
        /// Title as delivered upstream
        title: String,
        /// Viewer link
        link: String,
    },
    /// Embedded video
    YoutubeVideo {
        /// Provider-side video id
        remote_id: String,
        /// Title as delivered upstream
        title: String,
        /// Watch link
        link: String,
    },
    /// Plain link
    Link {
        /// Target URL
        url: String,
        /// Title as delivered upstream
        title: String,
    },
    /// Form
    Form {
        /// Form URL
        form_url: String,
        /// Title as delivered upstream
        title: String,
    },
}

impl MaterialDetail {
    /// Kind of this variant
    pub fn kind(&self) -> MaterialKind {
        match self {
            MaterialDetail::DriveFile { .. } => MaterialKind::DriveFile,
            MaterialDetail::YoutubeVideo { .. } => MaterialKind::YoutubeVideo,
            MaterialDetail::Link { .. } => MaterialKind::Link,
            MaterialDetail::Form { .. } => MaterialKind::Form,
        }
    }

    /// Provider-side identifier for drive files and videos
    pub fn remote_id(&self) -> Option<&str> {
        match self {
            MaterialDetail::DriveFile { remote_id, .. }
            | MaterialDetail::YoutubeVideo { remote_id, .. } => Some(remote_id),
            MaterialDetail::Link { .. } | MaterialDetail::Form { .. } => None,
        }
    }
}

/// A classified material: detail plus derived, sanitized title and URL
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    /// Database id once stored
    #[serde(default)]
    pub id: Option<i64>,
    /// Sanitized title, also the file name of downloaded drive files
    pub title: String,
    /// URL written to the links file or used to view the material
    pub url: String,
    /// The populated variant
    pub detail: MaterialDetail,
}

impl Material {
    /// Kind of the populated variant
    pub fn kind(&self) -> MaterialKind {
        self.detail.kind()
    }
}

/// Upstream material record with optional sub-payloads
///
/// Well-formed records populate exactly one field; classification tolerates more.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMaterial {
    /// Drive file wrapper
    pub drive_file: Option<SharedDriveFile>,
    /// Embedded video
    pub youtube_video: Option<YoutubeVideo>,
    /// Plain link
    pub link: Option<Link>,
    /// Form
    pub form: Option<Form>,
}

/// Drive file together with its sharing mode
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SharedDriveFile {
    /// The referenced file
    pub drive_file: DriveFile,
    /// Sharing mode of the attachment
    pub share_mode: Option<String>,
}

/// Drive file reference
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DriveFile {
    /// Drive file id
    pub id: String,
    /// File title
    pub title: String,
    /// Viewer link
    pub alternate_link: String,
}

/// Embedded video reference
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct YoutubeVideo {
    /// Video id
    pub id: String,
    /// Video title
    pub title: String,
    /// Watch link
    pub alternate_link: String,
}

/// Plain link reference
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Link {
    /// Target URL
    pub url: String,
    /// Page title
    pub title: String,
}

/// Form reference
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Form {
    /// Form URL
    pub form_url: String,
    /// Form title
    pub title: String,
}

/// Planning-time unit: one content item's materials and the folder they land in
#[derive(Clone, Debug, PartialEq)]
pub struct DownloadItem {
    /// Target folder, created before anything is written
    pub folder_path: PathBuf,
    /// Body text appended to the text file (skipped when empty)
    pub text: String,
    /// Kind of the source content item
    pub kind: ContentKind,
    /// Owned copy of the content item's materials
    pub materials: Vec<Material>,
}

/// Failure of a single download item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Folder of the failed item
    pub folder: PathBuf,
    /// What went wrong
    pub error: String,
}

/// Aggregated outcome of a download batch
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Number of download items in the batch
    pub items_total: usize,
    /// Items whose every step succeeded
    pub items_succeeded: usize,
    /// Items with at least one failed step
    pub items_failed: usize,
    /// Binary files written
    pub files_downloaded: usize,
    /// Link lines appended
    pub links_saved: usize,
    /// Per-item failures, in completion order
    pub failures: Vec<ItemFailure>,
}

impl BatchReport {
    /// True when no item failed
    pub fn is_success(&self) -> bool {
        self.items_failed == 0
    }

    /// Collapse the report into a single error if any item failed
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let first_error = self
            .failures
            .first()
            .map(|f| format!("{}: {}", f.folder.display(), f.error))
            .unwrap_or_default();
        Err(Error::Download(DownloadError::BatchFailed {
            failed: self.items_failed,
            total: self.items_total,
            first_error,
        }))
    }
}

/// Event emitted during discovery, download and archiving
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Newly discovered courses were stored
    CoursesDiscovered {
        /// Number of courses stored
        count: usize,
    },

    /// A download batch started
    BatchStarted {
        /// Number of download items planned
        items: usize,
    },

    /// A download item finished without errors
    ItemCompleted {
        /// Folder of the item
        folder: PathBuf,
    },

    /// A download item finished with at least one error
    ItemFailed {
        /// Folder of the item
        folder: PathBuf,
        /// First error of the item
        error: String,
    },

    /// The access token was renewed in the background
    CredentialRefreshed {
        /// New expiry, if reported
        #[serde(skip_serializing_if = "Option::is_none")]
        expiry: Option<DateTime<Utc>>,
    },

    /// A background token renewal failed; the previous token stays in use
    CredentialRefreshFailed {
        /// Error message
        error: String,
    },

    /// A download batch finished
    BatchComplete {
        /// Items that succeeded
        succeeded: usize,
        /// Items that failed
        failed: usize,
    },

    /// An archive is ready to be served
    ArchiveReady {
        /// Archive location
        path: PathBuf,
    },
}
