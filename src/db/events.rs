//! Pending event queue operations.

use crate::error::DatabaseError;
use crate::types::{RawRecord, RecordId};
use crate::{Error, Result};

use super::{Database, EventRow, NewEvent, PAGE_EVENT_TYPE};

impl Database {
    /// All pending notification events, oldest first
    pub async fn fetch_pending_records(&self) -> Result<Vec<RawRecord>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT evsysseq, evfields, evtime
            FROM eventoutm1
            WHERE evtype = ? AND evtime IS NOT NULL AND evsysseq IS NOT NULL
            ORDER BY evtime, evsysseq
            "#,
        )
        .bind(PAGE_EVENT_TYPE)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to fetch pending events: {}",
                e
            )))
        })?;

        tracing::debug!(count = rows.len(), "Fetched pending events");

        Ok(rows.into_iter().map(RawRecord::from).collect())
    }

    /// Delete a processed notification event.
    ///
    /// A key that matches nothing is logged but not treated as a failure.
    pub async fn delete_record(&self, id: &RecordId) -> Result<()> {
        let result = sqlx::query("DELETE FROM eventoutm1 WHERE evsysseq = ? AND evtype = ?")
            .bind(id)
            .bind(PAGE_EVENT_TYPE)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::DeleteFailed {
                    id: id.to_string(),
                    reason: e.to_string(),
                })
            })?;

        if result.rows_affected() == 0 {
            tracing::warn!(record_id = %id, "Record to remove was not found");
        } else {
            tracing::info!(record_id = %id, "Record removed: evsysseq = {}", id);
        }

        Ok(())
    }

    /// Queue a new event
    pub async fn insert_event(&self, event: &NewEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO eventoutm1 (evsysseq, evtype, evtime, evfields)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.event_type)
        .bind(event.event_time)
        .bind(&event.payload)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert event: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Number of events of any type still in the queue
    pub async fn count_events(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM eventoutm1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count events: {}",
                    e
                )))
            })
    }
}
