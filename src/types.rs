//! Core types for notification-extractor

use chrono::NaiveDateTime;
use std::time::Duration;

/// Opaque queue key of an event record (`evsysseq`)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub String);

impl RecordId {
    /// Create a new RecordId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for RecordId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for RecordId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for RecordId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// One pending event from the queue table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRecord {
    /// Unique queue key
    pub id: RecordId,
    /// Raw event payload (`evfields`)
    pub payload: String,
    /// Time the event was queued
    pub event_time: NaiveDateTime,
}

/// A notification decoded from an event payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedNotification {
    /// Business record type (e.g. `INCIDENT`, `LINEITEM`), non-word characters stripped
    pub ticket_source: String,
    /// Business record identifier, verbatim
    pub ticket_number: String,
    /// Whether the upstream system flagged attachments (`AA`)
    pub with_attachments: bool,
    /// Path the notification is written to
    pub destination_path: String,
    /// Final path segment of `destination_path`
    pub file_name: String,
    /// Body text with CRLF line endings, header line removed
    pub body: String,
}

impl ParsedNotification {
    /// Directory part of the destination path (everything before the file name)
    pub fn directory(&self) -> &str {
        self.destination_path
            .strip_suffix(self.file_name.as_str())
            .unwrap_or("")
    }
}

/// Why the parser refused to produce a notification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MalformedReason {
    /// No terminal marker in the payload
    MissingTerminalMarker,
    /// No start marker before the terminal marker
    MissingStartMarker,
    /// Nothing follows the start marker to serve as separator
    MissingSeparator,
    /// Fewer than eight separators follow the start marker
    TooFewSeparators,
    /// The header line has fewer than four tokens
    TooFewHeaderTokens,
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            MalformedReason::MissingTerminalMarker => "terminal marker not found",
            MalformedReason::MissingStartMarker => "start marker not found",
            MalformedReason::MissingSeparator => "no separator after start marker",
            MalformedReason::TooFewSeparators => "fewer than 8 separators before header",
            MalformedReason::TooFewHeaderTokens => "fewer than 4 header tokens",
        };
        f.write_str(reason)
    }
}

/// Expected, non-error rejection of a payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// The payload does not follow the message format
    Malformed(MalformedReason),
    /// The notification targets another customer tool
    Ignored,
    /// The upstream system flagged the message as missing arguments
    Incomplete,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Malformed(reason) => write!(f, "invalid message format ({reason})"),
            Rejection::Ignored => f.write_str("message for another interface"),
            Rejection::Incomplete => f.write_str("message is incomplete"),
        }
    }
}

/// One stored chunk of an attachment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentSegmentRow {
    /// Original attachment file name
    pub file_name: String,
    /// Attachment identifier
    pub uid: String,
    /// Whether the concatenated payload is zlib-compressed
    pub compressed: bool,
    /// Raw segment bytes, including the per-segment header
    pub data: Vec<u8>,
    /// Declared uncompressed size of the attachment
    pub normal_size: i64,
    /// Declared compressed size of the attachment
    pub compressed_size: i64,
    /// Modification time (first ordering key)
    pub mod_time: NaiveDateTime,
    /// Position of this segment within the attachment (last ordering key)
    pub segment: i64,
}

/// A reconstructed attachment, ready to be written.
///
/// Its saved file name is assigned at write time and returned by
/// [`crate::writer::save_attachment`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    /// Original file name with `?` replaced by `_`
    pub file_name: String,
    /// Attachment identifier
    pub uid: String,
    /// Whether the stored payload was compressed
    pub compressed: bool,
    /// Final attachment content (inflated if it was compressed)
    pub content: Vec<u8>,
    /// Declared uncompressed size from the first segment
    pub normal_size: i64,
    /// Declared compressed size from the first segment
    pub compressed_size: i64,
}

/// Inclusive lookup window for attachment segments
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    /// Lower bound
    pub start: NaiveDateTime,
    /// Upper bound
    pub end: NaiveDateTime,
}

/// What happened to a record after processing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Removed from the queue
    Deleted,
    /// Left in the queue (read-only run or failed delete)
    Retained,
}

/// Terminal outcome of processing one record
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// The payload does not follow the message format
    Malformed(MalformedReason),
    /// Addressed to another customer tool
    Ignored,
    /// Upstream flagged the message as incomplete
    Incomplete,
    /// Notification written
    Processed {
        /// Number of attachments written alongside the notification
        attachments_saved: usize,
        /// Whether the record left the queue
        delete: DeleteStatus,
    },
    /// Unexpected error while processing
    Failed(String),
}

impl From<Rejection> for ProcessingOutcome {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Malformed(reason) => ProcessingOutcome::Malformed(reason),
            Rejection::Ignored => ProcessingOutcome::Ignored,
            Rejection::Incomplete => ProcessingOutcome::Incomplete,
        }
    }
}

/// Aggregate counts reported at the end of a run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records fetched from the queue
    pub total: usize,
    /// Notifications addressed to this customer tool and complete
    pub accepted: u64,
    /// Notifications written to disk
    pub processed: usize,
    /// Records removed from the queue
    pub deleted: usize,
    /// Written notifications left in the queue
    pub retained: usize,
    /// Records with an invalid format
    pub malformed: usize,
    /// Records for another interface
    pub ignored: usize,
    /// Records flagged incomplete
    pub incomplete: usize,
    /// Records that failed unexpectedly
    pub failed: usize,
    /// Wall time spent processing records
    pub elapsed: Duration,
}

impl RunSummary {
    /// Count one record outcome
    pub fn record(&mut self, outcome: &ProcessingOutcome) {
        match outcome {
            ProcessingOutcome::Malformed(_) => self.malformed += 1,
            ProcessingOutcome::Ignored => self.ignored += 1,
            ProcessingOutcome::Incomplete => self.incomplete += 1,
            ProcessingOutcome::Processed { delete, .. } => {
                self.processed += 1;
                match delete {
                    DeleteStatus::Deleted => self.deleted += 1,
                    DeleteStatus::Retained => self.retained += 1,
                }
            }
            ProcessingOutcome::Failed(_) => self.failed += 1,
        }
    }
}
