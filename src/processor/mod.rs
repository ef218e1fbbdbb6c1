//! Record processing: the per-record pipeline from payload to files on disk.
//!
//! Split into focused submodules:
//! - [`context`] - Shared collaborators for every record task
//! - [`orchestration`] - Top-level record lifecycle and queue removal
//! - [`attachments`] - Lookup window, phase number fallback, attachment writes

mod attachments;
mod context;
mod orchestration;


pub use attachments::{LINE_ITEM_SOURCE, WINDOW_TOLERANCE_SECS, notification_window};
pub use context::RecordContext;
pub use orchestration::process_record;
