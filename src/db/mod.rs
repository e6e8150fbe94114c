//! Database layer for classroom-dl
//!
//! Handles SQLite persistence for sessions, courses, content items and materials.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`courses`] - Course tree storage and loading, file-id lookup
//! - [`sessions`] - Session credentials

use sqlx::{FromRow, sqlite::SqlitePool};

mod courses;
mod migrations;
mod sessions;

/// Course record from database
#[derive(Debug, Clone, FromRow)]
pub(crate) struct CourseRow {
    /// Upstream course id
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Optional section label
    pub section: Option<String>,
}

/// Content item record from database
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ContentItemRow {
    /// Database id
    pub id: i64,
    /// Course this item belongs to
    pub course_id: String,
    /// Upstream item id
    pub remote_id: String,
    /// 0 = announcement, 1 = coursework
    pub kind: i32,
    /// Body text
    pub text: String,
    /// Creation time in milliseconds since the Unix epoch
    pub creation_time: i64,
}

/// Material record from database
#[derive(Debug, Clone, FromRow)]
pub(crate) struct MaterialRow {
    /// Database id
    pub id: i64,
    /// Content item this material belongs to
    pub content_item_id: i64,
    /// Material kind (`driveFile`, `youtubeVideo`, `link`, `form`)
    pub kind: String,
    /// Sanitized title
    pub title: String,
    /// Derived URL
    pub url: String,
    /// Provider-side id for drive files and videos
    pub remote_id: Option<String>,
    /// Title as delivered upstream
    pub detail_title: String,
    /// Link, URL or form URL of the variant
    pub detail_link: String,
}

/// Session record from database
#[derive(Debug, Clone, FromRow)]
pub(crate) struct SessionRow {
    /// Owning user
    pub user_id: String,
    /// Current access token
    pub access_token: String,
    /// Refresh token, if granted
    pub refresh_token: Option<String>,
    /// Access token expiry as a Unix timestamp
    pub expiry: Option<i64>,
}

/// Database handle for classroom-dl
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
