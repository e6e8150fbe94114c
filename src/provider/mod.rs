//! Upstream providers: course discovery, binary content and file-id lookup
//!
//! Each seam is a trait so the download pipeline can run against the real
//! HTTP clients ([`ClassroomClient`], [`DriveClient`]) or against test doubles.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Course, Material};

mod classroom;
mod drive;

pub use classroom::ClassroomClient;
pub use drive::DriveClient;

/// Source of the user's courses with their announcements, coursework and materials
#[async_trait]
pub trait CourseProvider: Send + Sync {
    /// Fetch every course visible to the token's owner, fully populated
    ///
    /// Returned courses carry an empty `user_id`; the caller assigns the owner.
    async fn list_courses(&self, access_token: &str) -> Result<Vec<Course>>;
}

/// Source of binary file content
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Stream the file `file_id` into `dest`, replacing any existing file.
    ///
    /// Returns the number of bytes written.
    async fn download_file(&self, access_token: &str, file_id: &str, dest: &Path) -> Result<u64>;
}

/// Maps drive materials to provider-side file identifiers
#[async_trait]
pub trait FileIdResolver: Send + Sync {
    /// File id stored for this exact material
    async fn file_id_for_material(&self, material: &Material) -> Result<Option<String>>;

    /// File id of any stored drive material with this sanitized title
    async fn file_id_by_title(&self, title: &str) -> Result<Option<String>>;
}
