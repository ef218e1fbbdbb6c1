//! Concurrency coordinator: fans a batch of records out over a bounded task pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use futures::stream::{self, StreamExt};

use crate::processor::{RecordContext, process_record};
use crate::types::{ProcessingOutcome, RawRecord, RunSummary};

/// Number of notifications accepted during a run, shared by all record tasks
#[derive(Debug, Default)]
pub struct AcceptedCounter(AtomicU64);

impl AcceptedCounter {
    /// Count one accepted notification. Returns the new total.
    pub fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current total
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Process every record at no more than `ctx.config.concurrency` at a time.
///
/// Waits for all records to finish. Each record runs in its own task, so one
/// that panics is counted as failed without affecting the others.
pub async fn run_records(ctx: Arc<RecordContext>, records: Vec<RawRecord>) -> RunSummary {
    let started = Instant::now();
    let concurrency = ctx.config().concurrency.max(1);
    let mut summary = RunSummary {
        total: records.len(),
        ..RunSummary::default()
    };

    let outcomes: Vec<ProcessingOutcome> = stream::iter(records)
        .map(|record| {
            let ctx = ctx.clone();
            async move {
                let id = record.id.clone();
                let handle = tokio::spawn(async move { process_record(&ctx, &record).await });
                match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!(record_id = %id, error = %e, "Record task aborted");
                        ProcessingOutcome::Failed(e.to_string())
                    }
                }
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    for outcome in &outcomes {
        summary.record(outcome);
    }
    summary.accepted = ctx.accepted().get();
    summary.elapsed = started.elapsed();
    summary
}
