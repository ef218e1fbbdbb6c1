//! Attachment segment and phase number lookups.

use crate::error::DatabaseError;
use crate::types::{AttachmentSegmentRow, TimeWindow};
use crate::{Error, Result};

use super::{COMPRESSED_FLAG, Database, NewSegment, SegmentRow};

impl Database {
    /// Segment rows of the attachments stored for `topic` within `window`.
    ///
    /// An attachment is selected by the modification time of its first segment.
    /// `limit` caps the number of attachments, not rows. Rows come back ordered
    /// by `(sysmodtime, UID, segment)`, which the assembler relies on.
    pub async fn fetch_attachment_rows(
        &self,
        topic: &str,
        window: TimeWindow,
        limit: Option<u32>,
    ) -> Result<Vec<AttachmentSegmentRow>> {
        // SQLite treats a negative LIMIT as unbounded
        let uid_limit = limit.map_or(-1, i64::from);

        let rows = sqlx::query_as::<_, SegmentRow>(
            r#"
            SELECT filename, "UID" AS uid, compressed, "DATA" AS data,
                   "SIZE" AS normal_size, compressed_size, sysmodtime, segment
            FROM sysattachmem1
            WHERE topic = ?
              AND sysmodtime BETWEEN ? AND ?
              AND "UID" IN (
                  SELECT "UID" FROM sysattachmem1
                  WHERE topic = ? AND segment = 0 AND sysmodtime BETWEEN ? AND ?
                  ORDER BY sysmodtime, "UID"
                  LIMIT ?
              )
            ORDER BY sysmodtime, "UID", segment
            "#,
        )
        .bind(topic)
        .bind(window.start)
        .bind(window.end)
        .bind(topic)
        .bind(window.start)
        .bind(window.end)
        .bind(uid_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to fetch attachments for {}: {}",
                topic, e
            )))
        })?;

        tracing::debug!(
            topic,
            start = %window.start,
            end = %window.end,
            rows = rows.len(),
            "Fetched attachment segments"
        );

        Ok(rows.into_iter().map(AttachmentSegmentRow::from).collect())
    }

    /// Phase number of a ticket, or an empty string when the ticket has none
    pub async fn fetch_phase_number(&self, ticket_number: &str) -> Result<String> {
        let phase: Option<Option<String>> =
            sqlx::query_scalar(r#"SELECT phase_num FROM ocmlm1 WHERE "NUMBER" = ?"#)
                .bind(ticket_number)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to fetch phase number for {}: {}",
                        ticket_number, e
                    )))
                })?;

        Ok(phase.flatten().unwrap_or_default())
    }

    /// Store one attachment segment
    pub async fn insert_segment(&self, segment: &NewSegment) -> Result<()> {
        let compressed = if segment.compressed {
            COMPRESSED_FLAG
        } else {
            "f"
        };

        sqlx::query(
            r#"
            INSERT INTO sysattachmem1 (
                topic, filename, "UID", segment, "DATA", compressed, "SIZE", compressed_size, sysmodtime
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&segment.topic)
        .bind(&segment.file_name)
        .bind(&segment.uid)
        .bind(segment.segment)
        .bind(&segment.data)
        .bind(compressed)
        .bind(segment.normal_size)
        .bind(segment.compressed_size)
        .bind(segment.mod_time)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert attachment segment: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Record the phase number of a ticket, replacing any previous value
    pub async fn insert_phase_number(&self, ticket_number: &str, phase_number: &str) -> Result<()> {
        sqlx::query(r#"INSERT OR REPLACE INTO ocmlm1 ("NUMBER", phase_num) VALUES (?, ?)"#)
            .bind(ticket_number)
            .bind(phase_number)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert phase number: {}",
                    e
                )))
            })?;

        Ok(())
    }
}
