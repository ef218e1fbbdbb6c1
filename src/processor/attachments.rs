//! Attachment resolution for accepted notifications.

use chrono::{Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::assembler;
use crate::types::{AttachmentSegmentRow, ParsedNotification, TimeWindow};
use crate::writer;
use crate::{Error, Result};

use super::context::RecordContext;

/// Ticket source whose attachments may be stored under the phase number
pub const LINE_ITEM_SOURCE: &str = "LINEITEM";

/// Width of the attachment lookup window after the notification time
pub const WINDOW_TOLERANCE_SECS: i64 = 10;

/// Length of the timestamp prefix of notification file names
pub const TIMESTAMP_LEN: usize = 14;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Lookup window derived from the `yyyyMMddHHmmss` prefix of a notification file name.
///
/// The prefix is UTC; attachment modification times are stored as wall-clock
/// time in `time_zone`.
pub fn notification_window(file_name: &str, time_zone: Tz) -> Result<TimeWindow> {
    let stamp = file_name.get(..TIMESTAMP_LEN).ok_or_else(|| {
        Error::Timestamp(format!(
            "file name {} has no {}-digit timestamp prefix",
            file_name, TIMESTAMP_LEN
        ))
    })?;
    let utc = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
        .map_err(|e| Error::Timestamp(format!("{}: {}", stamp, e)))?;

    let start = Utc
        .from_utc_datetime(&utc)
        .with_timezone(&time_zone)
        .naive_local();

    Ok(TimeWindow {
        start,
        end: start + Duration::seconds(WINDOW_TOLERANCE_SECS),
    })
}

/// Fetch the segment rows for a notification's attachments.
///
/// Line item attachments are sometimes stored under the phase number; that key
/// is tried when the ticket number finds nothing.
pub(super) async fn resolve_attachment_rows(
    ctx: &RecordContext,
    notification: &ParsedNotification,
) -> Result<Vec<AttachmentSegmentRow>> {
    let window = notification_window(&notification.file_name, ctx.config.time_zone)?;
    let limit = ctx.config.attachments.limit();

    let rows = ctx
        .source
        .fetch_attachment_rows(&notification.ticket_number, window, limit)
        .await?;
    if !rows.is_empty() || notification.ticket_source != LINE_ITEM_SOURCE {
        return Ok(rows);
    }

    let phase = ctx
        .source
        .fetch_phase_number(&notification.ticket_number)
        .await?;
    if phase.is_empty() {
        tracing::debug!(
            ticket_number = %notification.ticket_number,
            "No phase number for line item"
        );
        return Ok(rows);
    }

    tracing::debug!(
        ticket_number = %notification.ticket_number,
        phase_number = %phase,
        "Retrying attachment lookup with phase number"
    );
    ctx.source
        .fetch_attachment_rows(&phase, window, limit)
        .await
}

/// Assemble and write every attachment. Returns the names that were saved.
///
/// A failed attachment is logged and skipped; it keeps its sequence number so
/// the names of its siblings do not shift.
pub(super) async fn save_attachments(
    notification: &ParsedNotification,
    rows: &[AttachmentSegmentRow],
) -> Vec<String> {
    let mut saved = Vec::new();

    for (index, assembled) in assembler::assemble(rows).into_iter().enumerate() {
        let sequence = index + 1;
        let result = match assembled {
            Ok(attachment) => writer::save_attachment(notification, sequence, &attachment).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(name) => saved.push(name),
            Err(e) => {
                tracing::error!(
                    file_name = %notification.file_name,
                    sequence,
                    error = %e,
                    "Attachment dropped"
                );
            }
        }
    }

    saved
}
