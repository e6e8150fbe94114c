//! Error types for classroom-dl
//!
//! This module provides the error handling for the library, including:
//! - Domain-specific error types (Download, Credential, Archive, etc.)
//! - HTTP status code mapping for the request-handling layer
//! - Structured error bodies with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for classroom-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for classroom-dl
///
/// Each variant carries enough context to diagnose the failure without a backtrace.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrent_downloads")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Credential lookup or refresh error
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Download-related error
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// Archive creation error
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Upstream API answered with a non-success status
    #[error("upstream error {status}: {message}")]
    Upstream {
        /// HTTP status returned by the upstream service
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Credential lookup and refresh errors
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No credential stored for the session
    #[error("no credential stored for session {session}")]
    SessionNotFound {
        /// The session that has no stored credential
        session: String,
    },

    /// The credential has no refresh token, so it cannot be renewed
    #[error("credential has no refresh token")]
    MissingRefreshToken,

    /// The identity provider rejected the refresh request
    #[error("token refresh rejected with status {status}: {reason}")]
    RefreshRejected {
        /// HTTP status returned by the token endpoint
        status: u16,
        /// Error description from the token endpoint
        reason: String,
    },
}

/// Download-related errors
#[derive(Debug, Error)]
pub enum DownloadError {
    /// No provider file id could be resolved for a drive material
    #[error("no file id found for material {title}")]
    FileIdNotFound {
        /// Sanitized title of the material
        title: String,
    },

    /// The content provider refused to deliver a file
    #[error("fetch of file {file_id} failed with status {status}")]
    FetchFailed {
        /// Provider-side file identifier
        file_id: String,
        /// HTTP status returned by the provider
        status: u16,
    },

    /// A download task panicked or was aborted before finishing
    #[error("download task did not complete: {reason}")]
    TaskAborted {
        /// The join error reported by the runtime
        reason: String,
    },

    /// One or more items of a batch failed
    #[error("{failed} of {total} download items failed (first error: {first_error})")]
    BatchFailed {
        /// Number of failed items
        failed: usize,
        /// Number of items in the batch
        total: usize,
        /// The first recorded failure message
        first_error: String,
    },
}

/// Archive creation errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The folder to archive does not exist
    #[error("archive source {path} does not exist")]
    SourceMissing {
        /// The missing source folder
        path: PathBuf,
    },

    /// The folder to archive contains no regular files
    #[error("archive source {path} is empty")]
    EmptySource {
        /// The empty source folder
        path: PathBuf,
    },

    /// Writing the archive failed
    #[error("failed to write archive {archive}: {reason}")]
    WriteFailed {
        /// The archive being written
        archive: PathBuf,
        /// The reason writing failed
        reason: String,
    },
}

/// Error body returned to requesters by the HTTP layer
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "empty_archive_source",
///     "message": "archive error: archive source /tmp/x is empty",
///     "details": { "path": "/tmp/x" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "config_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }
}

/// Convert errors to HTTP status codes for the request-handling layer
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,

            Error::NotFound(_) => 404,
            Error::Credential(CredentialError::SessionNotFound { .. }) => 401,
            Error::Credential(CredentialError::MissingRefreshToken) => 401,

            // Nothing to serve
            Error::Archive(ArchiveError::SourceMissing { .. }) => 404,
            Error::Archive(ArchiveError::EmptySource { .. }) => 500,
            Error::Archive(ArchiveError::WriteFailed { .. }) => 500,

            Error::Download(DownloadError::BatchFailed { .. }) => 500,
            Error::Download(DownloadError::TaskAborted { .. }) => 500,

            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::Other(_) => 500,

            // External service errors
            Error::Credential(CredentialError::RefreshRejected { .. }) => 502,
            Error::Download(DownloadError::FileIdNotFound { .. }) => 502,
            Error::Download(DownloadError::FetchFailed { .. }) => 502,
            Error::Upstream { .. } => 502,
            Error::Network(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Credential(e) => match e {
                CredentialError::SessionNotFound { .. } => "session_not_found",
                CredentialError::MissingRefreshToken => "missing_refresh_token",
                CredentialError::RefreshRejected { .. } => "refresh_rejected",
            },
            Error::Download(e) => match e {
                DownloadError::FileIdNotFound { .. } => "file_id_not_found",
                DownloadError::FetchFailed { .. } => "fetch_failed",
                DownloadError::TaskAborted { .. } => "task_aborted",
                DownloadError::BatchFailed { .. } => "batch_failed",
            },
            Error::Archive(e) => match e {
                ArchiveError::SourceMissing { .. } => "archive_source_missing",
                ArchiveError::EmptySource { .. } => "empty_archive_source",
                ArchiveError::WriteFailed { .. } => "archive_write_failed",
            },
            Error::Upstream { .. } => "upstream_error",
            Error::Io(_) => "io_error",
            Error::NotFound(_) => "not_found",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            Error::Download(DownloadError::BatchFailed { failed, total, .. }) => {
                Some(serde_json::json!({
                    "failed_items": failed,
                    "total_items": total,
                }))
            }
            Error::Archive(ArchiveError::SourceMissing { path })
            | Error::Archive(ArchiveError::EmptySource { path }) => {
                Some(serde_json::json!({ "path": path }))
            }
            Error::Upstream { status, .. } => Some(serde_json::json!({ "upstream_status": status })),
            _ => None,
        };

        match details {
            Some(details) => ApiError::with_details(code, message, details),
            None => ApiError::new(code, message),
        }
    }
}
