//! Error types for notification-extractor
//!
//! This module provides the error taxonomy for a run:
//! - Fatal errors (configuration, database connection) that abort the whole run
//! - Per-record errors (queries, timestamps, I/O) that fail a single record
//! - Per-attachment errors (truncated segments, inflate, persist) that drop one attachment
//!
//! Parser rejections (malformed, ignored, incomplete) are not errors; they are
//! values of [`crate::types::Rejection`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for notification-extractor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for notification-extractor
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "customer_tool")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// The notification timestamp embedded in the file name could not be read
    #[error("invalid notification timestamp: {0}")]
    Timestamp(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Whether this error must abort the whole run rather than a single record.
    ///
    /// Only configuration problems and a failure to reach the database are fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Config { .. } | Error::Database(DatabaseError::ConnectionFailed(_))
        )
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Deleting a processed record failed
    #[error("failed to delete record {id}: {reason}")]
    DeleteFailed {
        /// The queue key of the record
        id: String,
        /// The reason the delete failed
        reason: String,
    },
}

/// Attachment errors. Each one affects a single attachment only.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// A segment is shorter than the header its indicator byte announces
    #[error("segment {segment} of {file_name} is {len} bytes, shorter than its {header}-byte header")]
    TruncatedSegment {
        /// Original attachment file name
        file_name: String,
        /// Segment position within the attachment (0-based)
        segment: usize,
        /// Length of the raw segment
        len: usize,
        /// Header length implied by the indicator byte
        header: usize,
    },

    /// Decompressing a compressed attachment failed
    #[error("failed to inflate {file_name}: {reason}")]
    Inflate {
        /// Original attachment file name
        file_name: String,
        /// The reason decompression failed
        reason: String,
    },

    /// Writing the attachment to disk failed
    #[error("failed to save attachment to {path}: {reason}")]
    Persist {
        /// Destination path of the attachment
        path: PathBuf,
        /// The reason the write failed
        reason: String,
    },
}
