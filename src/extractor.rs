//! Run lifecycle: fetch pending records, process them, report.

use std::sync::Arc;
use std::time::Instant;

use crate::config::{Config, RunConfig};
use crate::coordinator::run_records;
use crate::db::Database;
use crate::processor::RecordContext;
use crate::source::RecordSource;
use crate::types::RunSummary;
use crate::Result;

/// Drains the pending notification queue once
pub struct NotificationExtractor {
    source: Arc<dyn RecordSource>,
    config: Arc<RunConfig>,
}

impl NotificationExtractor {
    /// Validate the configuration and connect to the queue database.
    ///
    /// Both failures are fatal.
    pub async fn new(config: &Config) -> Result<Self> {
        let run_config = config.run_config()?;
        let db = Database::connect(&config.database).await?;
        Ok(Self::with_source(run_config, Arc::new(db)))
    }

    /// Build an extractor over any record source
    pub fn with_source(config: RunConfig, source: Arc<dyn RecordSource>) -> Self {
        Self {
            source,
            config: Arc::new(config),
        }
    }

    /// Process every pending record once, then close the record source.
    ///
    /// Only a failure to read the queue is returned as an error; per-record
    /// problems are counted in the summary.
    pub async fn run(&self) -> Result<RunSummary> {
        let result = self.drain().await;
        self.source.close().await;
        tracing::debug!("Record source closed");
        result
    }

    async fn drain(&self) -> Result<RunSummary> {
        let started = Instant::now();
        tracing::info!(
            customer_tool = %self.config.customer_tool,
            time_zone = %self.config.time_zone,
            "{}",
            self.config.describe_mode()
        );

        let records = self.source.fetch_pending_records().await?;
        if records.is_empty() {
            tracing::info!("No records found");
            return Ok(RunSummary {
                elapsed: started.elapsed(),
                ..RunSummary::default()
            });
        }
        tracing::info!(count = records.len(), "Records found: {}", records.len());

        let ctx = Arc::new(RecordContext::new(
            self.source.clone(),
            self.config.clone(),
        ));
        let summary = run_records(ctx, records).await;

        tracing::info!(
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "All records completed in {:.3}s",
            summary.elapsed.as_secs_f64()
        );
        tracing::info!(
            processed = summary.processed,
            deleted = summary.deleted,
            retained = summary.retained,
            malformed = summary.malformed,
            ignored = summary.ignored,
            incomplete = summary.incomplete,
            failed = summary.failed,
            "Total notifications found: {}",
            summary.accepted
        );
        tracing::info!(
            "Total execution time: {:.3}s",
            started.elapsed().as_secs_f64()
        );

        Ok(summary)
    }
}
