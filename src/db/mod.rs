//! Database layer for notification-extractor
//!
//! Reads the pending event queue and the attachment side store over SQLite.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`schema`] - Connection lifecycle, table creation
//! - [`events`] - Pending event queue reads and deletes
//! - [`attachments`] - Attachment segments and phase number lookups

use crate::source::RecordSource;
use crate::types::{AttachmentSegmentRow, RawRecord, RecordId, TimeWindow};
use crate::Result;
use chrono::NaiveDateTime;
use sqlx::{FromRow, sqlite::SqlitePool};

mod attachments;
mod events;
mod schema;

/// Event type of notification records in the queue
pub const PAGE_EVENT_TYPE: &str = "page";

/// Compressed flag value meaning the segment payload is zlib-compressed
pub const COMPRESSED_FLAG: &str = "t";

/// Event row from `eventoutm1`
#[derive(Debug, Clone, FromRow)]
pub(crate) struct EventRow {
    pub evsysseq: RecordId,
    pub evfields: Option<String>,
    pub evtime: NaiveDateTime,
}

impl From<EventRow> for RawRecord {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.evsysseq,
            payload: row.evfields.unwrap_or_default(),
            event_time: row.evtime,
        }
    }
}

/// Segment row from `sysattachmem1`
#[derive(Debug, Clone, FromRow)]
pub(crate) struct SegmentRow {
    pub filename: String,
    pub uid: String,
    pub compressed: Option<String>,
    pub data: Vec<u8>,
    pub normal_size: Option<i64>,
    pub compressed_size: Option<i64>,
    pub sysmodtime: NaiveDateTime,
    pub segment: i64,
}

impl From<SegmentRow> for AttachmentSegmentRow {
    fn from(row: SegmentRow) -> Self {
        Self {
            file_name: row.filename,
            uid: row.uid,
            compressed: row.compressed.as_deref() == Some(COMPRESSED_FLAG),
            data: row.data,
            normal_size: row.normal_size.unwrap_or(0),
            compressed_size: row.compressed_size.unwrap_or(0),
            mod_time: row.sysmodtime,
            segment: row.segment,
        }
    }
}

/// New event to be queued
#[derive(Debug, Clone)]
pub struct NewEvent {
    /// Queue key
    pub id: RecordId,
    /// Event type, `page` for notifications
    pub event_type: String,
    /// Time the event was queued
    pub event_time: NaiveDateTime,
    /// Raw payload
    pub payload: String,
}

/// New attachment segment to be stored
#[derive(Debug, Clone)]
pub struct NewSegment {
    /// Ticket number the attachment belongs to
    pub topic: String,
    /// Original attachment file name
    pub file_name: String,
    /// Attachment uid
    pub uid: String,
    /// Segment index within the attachment (0-based)
    pub segment: i64,
    /// Raw segment bytes including the segment header
    pub data: Vec<u8>,
    /// Whether the attachment is zlib-compressed
    pub compressed: bool,
    /// Declared uncompressed size
    pub normal_size: i64,
    /// Declared compressed size
    pub compressed_size: i64,
    /// Modification time in the store's time zone
    pub mod_time: NaiveDateTime,
}

/// Database handle for notification-extractor
pub struct Database {
    pool: SqlitePool,
}

#[async_trait::async_trait]
impl RecordSource for Database {
    async fn fetch_pending_records(&self) -> Result<Vec<RawRecord>> {
        Database::fetch_pending_records(self).await
    }

    async fn fetch_attachment_rows(
        &self,
        key: &str,
        window: TimeWindow,
        limit: Option<u32>,
    ) -> Result<Vec<AttachmentSegmentRow>> {
        Database::fetch_attachment_rows(self, key, window, limit).await
    }

    async fn fetch_phase_number(&self, ticket_number: &str) -> Result<String> {
        Database::fetch_phase_number(self, ticket_number).await
    }

    async fn delete_record(&self, id: &RecordId) -> Result<()> {
        Database::delete_record(self, id).await
    }

    async fn close(&self) {
        Database::close(self).await
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
