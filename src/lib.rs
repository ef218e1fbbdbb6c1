//! # notification-extractor
//!
//! Drains pending notification events from a queue table, decodes the
//! delimited message protocol carried in each payload, rebuilds attachments
//! from their stored segments and writes everything to disk.
//!
//! ## Pipeline
//!
//! For each pending record:
//! - [`parser`] decodes the payload and classifies it (malformed, ignored, incomplete, accepted)
//! - [`processor`] resolves attachment segments through a [`RecordSource`]
//! - [`assembler`] groups segments, strips their headers and inflates compressed payloads
//! - [`writer`] saves the attachments and the notification with its manifest
//! - the record is removed from the queue unless the run is read-only
//!
//! [`coordinator`] runs records concurrently with a fixed upper bound.
//!
//! ## Quick Start
//!
//! ```no_run
//! use notification_extractor::{Config, NotificationExtractor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_toml_str(
//!         r#"
//!         customer_tool = "ACME"
//!         tz_code = "Europe/Warsaw"
//!
//!         [database]
//!         path = "/var/lib/queue/eventout.db"
//!         "#,
//!     )?;
//!
//!     let extractor = NotificationExtractor::new(&config).await?;
//!     let summary = extractor.run().await?;
//!     println!("accepted {} notifications", summary.accepted);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Attachment segment reassembly
pub mod assembler;
/// Configuration types
pub mod config;
/// Bounded concurrent record processing
pub mod coordinator;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Run lifecycle
pub mod extractor;
/// Message protocol decoding
pub mod parser;
/// Per-record processing pipeline
pub mod processor;
/// Record source abstraction
pub mod source;
/// Core types
pub mod types;
/// Notification and attachment output
pub mod writer;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{AttachmentMode, Config, RunConfig};
pub use db::Database;
pub use error::{AttachmentError, DatabaseError, Error, Result};
pub use extractor::NotificationExtractor;
pub use parser::MessageParser;
pub use source::RecordSource;
pub use types::{
    Attachment, AttachmentSegmentRow, ParsedNotification, ProcessingOutcome, RawRecord, RecordId,
    Rejection, RunSummary, TimeWindow,
};
