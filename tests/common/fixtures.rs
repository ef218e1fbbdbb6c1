//! Queue fixtures: a seeded SQLite store and payload builders

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use notification_extractor::config::DatabaseConfig;
use notification_extractor::db::{NewEvent, NewSegment};
use notification_extractor::{Database, RecordId};

use super::config::CUSTOMER_TOOL;

/// A temporary queue database with the tables created
pub struct TestQueue {
    pub dir: tempfile::TempDir,
    pub db_path: PathBuf,
    pub db: Database,
}

impl TestQueue {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("eventout.db");
        std::fs::File::create(&db_path).unwrap();

        let db = Database::connect(&DatabaseConfig {
            path: db_path.clone(),
            max_connections: 1,
            ..DatabaseConfig::default()
        })
        .await
        .unwrap();
        db.create_schema().await.unwrap();

        Self { dir, db_path, db }
    }

    /// Destination path for a notification of the given customer tool
    pub fn destination(&self, tool: &str, file_name: &str) -> PathBuf {
        self.dir.path().join("out").join(tool).join(file_name)
    }

    pub async fn queue(&self, id: &str, payload: String) {
        self.db
            .insert_event(&NewEvent {
                id: RecordId::from(id),
                event_type: "page".to_string(),
                event_time: at(3, 4, 5),
                payload,
            })
            .await
            .unwrap();
    }

    /// Store an attachment split into `chunks` segments, each with a 9-byte header
    pub async fn store_attachment(
        &self,
        topic: &str,
        file_name: &str,
        uid: &str,
        compressed: bool,
        chunks: &[&[u8]],
        mod_time: NaiveDateTime,
    ) {
        for (index, chunk) in chunks.iter().enumerate() {
            self.db
                .insert_segment(&NewSegment {
                    topic: topic.to_string(),
                    file_name: file_name.to_string(),
                    uid: uid.to_string(),
                    segment: index as i64,
                    data: segment_bytes(chunk),
                    compressed,
                    normal_size: 0,
                    compressed_size: 0,
                    mod_time,
                })
                .await
                .unwrap();
        }
    }

    pub async fn pending_ids(&self) -> Vec<String> {
        self.db
            .fetch_pending_records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id.to_string())
            .collect()
    }
}

pub fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}

/// Segment bytes: a 9-byte header announced by `0x2D` at offset 7, then `body`
pub fn segment_bytes(body: &[u8]) -> Vec<u8> {
    let mut data = vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x2D, 0x09];
    data.extend_from_slice(body);
    data
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Event payload for one notification, using `^` as the field separator
pub fn notification_payload(
    ticket_source: &str,
    flag: &str,
    ticket_number: &str,
    destination: &Path,
    body: &str,
) -> String {
    format!(
        "Event queued by paging\r\ntelalert^-c^page^-g^{tool}^-m^notify^-i^{source}||{flag}||{number}||{path}||\r\n{body}$end\r\n",
        tool = CUSTOMER_TOOL,
        source = ticket_source,
        flag = flag,
        number = ticket_number,
        path = destination.display(),
        body = body,
    )
}
