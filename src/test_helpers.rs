//! Shared test helpers: an in-memory record source and payload builders.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::{AttachmentMode, RunConfig};
use crate::error::DatabaseError;
use crate::processor::RecordContext;
use crate::source::RecordSource;
use crate::types::{AttachmentSegmentRow, RawRecord, RecordId, TimeWindow};
use crate::{Error, Result};

pub(crate) const CUSTOMER_TOOL: &str = "ACMETOOL";

/// Notification file name with a valid timestamp prefix
pub(crate) const FILE_NAME: &str = "20240102030405.temp";

/// A call made against [`MockRecordSource`]
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SourceCall {
    FetchAttachments {
        key: String,
        window: TimeWindow,
        limit: Option<u32>,
    },
    FetchPhase(String),
    Delete(RecordId),
    Close,
}

/// In-memory [`RecordSource`] that records every call
#[derive(Default)]
pub(crate) struct MockRecordSource {
    records: Vec<RawRecord>,
    attachments: HashMap<String, Vec<AttachmentSegmentRow>>,
    phase_numbers: HashMap<String, String>,
    fail_deletes: bool,
    fail_attachment_lookups: bool,
    calls: Mutex<Vec<SourceCall>>,
}

impl MockRecordSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_records(mut self, records: Vec<RawRecord>) -> Self {
        self.records = records;
        self
    }

    pub(crate) fn with_attachments(mut self, key: &str, rows: Vec<AttachmentSegmentRow>) -> Self {
        self.attachments.insert(key.to_string(), rows);
        self
    }

    pub(crate) fn with_phase_number(mut self, ticket_number: &str, phase: &str) -> Self {
        self.phase_numbers
            .insert(ticket_number.to_string(), phase.to_string());
        self
    }

    pub(crate) fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub(crate) fn failing_attachment_lookups(mut self) -> Self {
        self.fail_attachment_lookups = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn deletes(&self) -> Vec<RecordId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SourceCall::Delete(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn attachment_queries(&self) -> Vec<(String, TimeWindow, Option<u32>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SourceCall::FetchAttachments { key, window, limit } => Some((key, window, limit)),
                _ => None,
            })
            .collect()
    }

    fn log(&self, call: SourceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl RecordSource for MockRecordSource {
    async fn fetch_pending_records(&self) -> Result<Vec<RawRecord>> {
        Ok(self.records.clone())
    }

    async fn fetch_attachment_rows(
        &self,
        key: &str,
        window: TimeWindow,
        limit: Option<u32>,
    ) -> Result<Vec<AttachmentSegmentRow>> {
        self.log(SourceCall::FetchAttachments {
            key: key.to_string(),
            window,
            limit,
        });
        if self.fail_attachment_lookups {
            return Err(Error::Database(DatabaseError::QueryFailed(
                "attachment store unavailable".to_string(),
            )));
        }
        Ok(self.attachments.get(key).cloned().unwrap_or_default())
    }

    async fn fetch_phase_number(&self, ticket_number: &str) -> Result<String> {
        self.log(SourceCall::FetchPhase(ticket_number.to_string()));
        Ok(self
            .phase_numbers
            .get(ticket_number)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_record(&self, id: &RecordId) -> Result<()> {
        self.log(SourceCall::Delete(id.clone()));
        if self.fail_deletes {
            return Err(Error::Database(DatabaseError::DeleteFailed {
                id: id.to_string(),
                reason: "connection reset".to_string(),
            }));
        }
        Ok(())
    }

    async fn close(&self) {
        self.log(SourceCall::Close);
    }
}

pub(crate) fn run_config(read_only: bool, attachments: AttachmentMode) -> RunConfig {
    RunConfig {
        customer_tool: CUSTOMER_TOOL.to_string(),
        time_zone: chrono_tz::UTC,
        read_only,
        attachments,
        concurrency: 4,
    }
}

pub(crate) fn context(source: Arc<MockRecordSource>, config: RunConfig) -> RecordContext {
    RecordContext::new(source, Arc::new(config))
}

/// Header line: ticket source, attachment flag, ticket number, destination path
pub(crate) fn header(source: &str, flag: &str, number: &str, destination: &Path) -> String {
    format!("{}||{}||{}||{}||", source, flag, number, destination.display())
}

/// Full event payload around a header line and body
pub(crate) fn payload(header: &str, body: &str) -> String {
    format!(
        "queued page\ntelalert|-c|page|-g|{}|-m|x|y|{}\n{}$end\n",
        CUSTOMER_TOOL, header, body
    )
}

pub(crate) fn event_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap()
}

pub(crate) fn record(id: &str, payload: String) -> RawRecord {
    RawRecord {
        id: RecordId::from(id),
        payload,
        event_time: event_time(),
    }
}

/// Segment row with a 9-byte header in front of `body`
pub(crate) fn segment_row(
    file_name: &str,
    uid: &str,
    compressed: bool,
    segment: i64,
    body: &[u8],
) -> AttachmentSegmentRow {
    let mut data = vec![0u8; 9];
    data[7] = crate::assembler::SHORT_HEADER_INDICATOR;
    data.extend_from_slice(body);
    AttachmentSegmentRow {
        file_name: file_name.to_string(),
        uid: uid.to_string(),
        compressed,
        data,
        normal_size: body.len() as i64,
        compressed_size: 0,
        mod_time: event_time(),
        segment,
    }
}
