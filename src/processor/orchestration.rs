//! Record orchestration: full lifecycle of a single queued event.

use crate::types::{DeleteStatus, ParsedNotification, ProcessingOutcome, RawRecord, Rejection};
use crate::writer;
use crate::Result;

use super::attachments::{resolve_attachment_rows, save_attachments};
use super::context::RecordContext;

/// Process one record to a terminal outcome.
///
/// Phases:
/// 1. Decode and classify the payload
/// 2. Resolve, assemble and write attachments (when flagged and enabled)
/// 3. Write the notification with its attachment manifest
/// 4. Remove the record from the queue (unless read-only)
///
/// Never returns an error: anything unexpected becomes [`ProcessingOutcome::Failed`].
pub async fn process_record(ctx: &RecordContext, record: &RawRecord) -> ProcessingOutcome {
    let id = &record.id;
    tracing::trace!(record_id = %id, payload = %record.payload, "Processing record");

    // Phase 1: decode and classify
    let notification = match ctx.parser.parse(&record.payload) {
        Ok(notification) => notification,
        Err(rejection) => {
            log_rejection(record, &rejection);
            return rejection.into();
        }
    };

    ctx.accepted.increment();
    tracing::info!(
        record_id = %id,
        ticket_source = %notification.ticket_source,
        ticket_number = %notification.ticket_number,
        file_name = %notification.file_name,
        "Notification accepted"
    );

    // Phases 2 and 3: attachments, then the notification itself
    let attachments_saved = match write_outputs(ctx, &notification).await {
        Ok(count) => count,
        Err(e) => {
            tracing::error!(
                record_id = %id,
                ticket_number = %notification.ticket_number,
                error = %e,
                "Record processing failed"
            );
            return ProcessingOutcome::Failed(e.to_string());
        }
    };

    // Phase 4: leave the queue
    let delete = remove_from_queue(ctx, record).await;

    ProcessingOutcome::Processed {
        attachments_saved,
        delete,
    }
}

fn log_rejection(record: &RawRecord, rejection: &Rejection) {
    match rejection {
        Rejection::Malformed(reason) => {
            tracing::info!(
                record_id = %record.id,
                reason = %reason,
                "Record ignored - invalid message format."
            );
        }
        Rejection::Ignored => {
            tracing::info!(record_id = %record.id, "Record ignored - {}", rejection);
        }
        Rejection::Incomplete => {
            tracing::warn!(record_id = %record.id, "Record ignored - {}", rejection);
        }
    }
}

/// Write attachments and the notification. Returns how many attachments were saved.
async fn write_outputs(ctx: &RecordContext, notification: &ParsedNotification) -> Result<usize> {
    let saved = if notification.with_attachments && ctx.config.attachments.enabled() {
        let rows = resolve_attachment_rows(ctx, notification).await?;
        if rows.is_empty() {
            tracing::debug!(
                ticket_number = %notification.ticket_number,
                "No attachments found"
            );
        }
        save_attachments(notification, &rows).await
    } else {
        Vec::new()
    };

    let path = writer::save_notification(notification, &saved).await?;
    tracing::info!(
        path = %path.display(),
        attachments = saved.len(),
        "Notification written"
    );

    Ok(saved.len())
}

/// Delete the record unless the run is read-only. A failed delete leaves the
/// record for the next run and does not fail it.
async fn remove_from_queue(ctx: &RecordContext, record: &RawRecord) -> DeleteStatus {
    if ctx.config.read_only {
        return DeleteStatus::Retained;
    }

    match ctx.source.delete_record(&record.id).await {
        Ok(()) => DeleteStatus::Deleted,
        Err(e) => {
            tracing::warn!(
                record_id = %record.id,
                error = %e,
                "Failed to remove record, it stays queued"
            );
            DeleteStatus::Retained
        }
    }
}
