//! Record source abstraction.
//!
//! The processor only talks to the queue through [`RecordSource`], so tests can
//! drive it with an in-memory source while production uses [`crate::db::Database`].

use crate::Result;
use crate::types::{AttachmentSegmentRow, RawRecord, RecordId, TimeWindow};

/// Access to the pending event queue and its attachment side store.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Pending page events with both a key and an event time
    async fn fetch_pending_records(&self) -> Result<Vec<RawRecord>>;

    /// Attachment segment rows for `key` whose first segment falls in `window`,
    /// ordered by modification time, uid and segment index.
    ///
    /// `limit` caps the number of distinct attachments returned.
    async fn fetch_attachment_rows(
        &self,
        key: &str,
        window: TimeWindow,
        limit: Option<u32>,
    ) -> Result<Vec<AttachmentSegmentRow>>;

    /// Phase number for a ticket, or an empty string when there is none
    async fn fetch_phase_number(&self, ticket_number: &str) -> Result<String>;

    /// Remove a processed record from the queue
    async fn delete_record(&self, id: &RecordId) -> Result<()>;

    /// Release the source's connections once a run is over
    async fn close(&self) {}
}
