//! End-to-end extraction over a seeded SQLite queue.

mod common;

use common::*;
use notification_extractor::NotificationExtractor;

#[tokio::test]
async fn test_run_writes_notifications_and_drains_queue() {
    let queue = TestQueue::new().await;
    let incident = queue.destination(CUSTOMER_TOOL, "20240102030405.temp");
    let line_item = queue.destination(CUSTOMER_TOOL, "20240102030406.temp");
    let foreign = queue.destination("OTHERDESK", "20240102030407.temp");

    queue
        .queue(
            "1",
            notification_payload("INCIDENT", "AA", "IM1001", &incident, "Hello\nWorld\n"),
        )
        .await;
    queue
        .queue(
            "2",
            notification_payload("INCIDENT", "NA", "IM1002", &foreign, "Not ours\n"),
        )
        .await;
    queue.queue("3", "truncated payload without markers".to_string()).await;
    queue
        .queue(
            "4",
            notification_payload("LINE-ITEM", "AA", "LI7", &line_item, "Line item\n"),
        )
        .await;

    let report = b"quarterly report ".repeat(40);
    queue
        .store_attachment("IM1001", "scan.pdf", "u1", false, &[b"%PDF-", b"1.4"], at(3, 4, 7))
        .await;
    queue
        .store_attachment("IM1001", "report?.txt", "u2", true, &[zlib(&report).as_slice()], at(3, 4, 8))
        .await;
    // Outside the ten second window
    queue
        .store_attachment("IM1001", "late.txt", "u3", false, &[b"late"], at(3, 5, 0))
        .await;
    queue.db.insert_phase_number("LI7", "PH7").await.unwrap();
    queue
        .store_attachment("PH7", "plan.txt", "u4", false, &[b"plan"], at(3, 4, 9))
        .await;

    let config = test_config(&queue.db_path, "UTC", "");
    let summary = NotificationExtractor::new(&config)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.deleted, 2);
    assert_eq!(summary.ignored, 1);
    assert_eq!(summary.malformed, 1);
    assert_eq!(summary.failed, 0);

    let out = incident.parent().unwrap();
    assert_notification(
        &incident,
        "Hello\r\nWorld\r\n&attachment=20240102030405_01_scan.pdf|20240102030405_02_report_.txt;\r\n",
    );
    assert_attachment(out, "20240102030405_01_scan.pdf", b"%PDF-1.4");
    assert_attachment(out, "20240102030405_02_report_.txt", &report);
    assert!(!out.join("20240102030405_03_late.txt").exists());

    assert_notification(
        &line_item,
        "Line item\r\n&attachment=20240102030406_01_plan.txt;\r\n",
    );
    assert_attachment(out, "20240102030406_01_plan.txt", b"plan");

    assert!(!foreign.exists());
    assert_eq!(queue.pending_ids().await, vec!["2", "3"]);
}

#[tokio::test]
async fn test_read_only_run_keeps_records() {
    let queue = TestQueue::new().await;
    let dest = queue.destination(CUSTOMER_TOOL, "20240102030405.temp");
    queue
        .queue("1", notification_payload("INCIDENT", "NA", "IM1", &dest, "Body\n"))
        .await;

    let config = test_config(&queue.db_path, "UTC", "read_only = true");
    let summary = NotificationExtractor::new(&config)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.retained, 1);
    assert_notification(&dest, "Body\r\n");
    assert_eq!(queue.pending_ids().await, vec!["1"]);
}

#[tokio::test]
async fn test_attachment_limit_and_ignore_modes() {
    let queue = TestQueue::new().await;
    let limited = queue.destination(CUSTOMER_TOOL, "20240102030405.temp");
    queue
        .queue("1", notification_payload("INCIDENT", "AA", "IM1", &limited, "x\n"))
        .await;
    for (uid, second) in [("a", 6), ("b", 7), ("c", 8)] {
        queue
            .store_attachment("IM1", &format!("{uid}.txt"), uid, false, &[uid.as_bytes()], at(3, 4, second))
            .await;
    }

    let config = test_config(&queue.db_path, "UTC", "attachments = { limit = 2 }");
    let summary = NotificationExtractor::new(&config)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.processed, 1);
    assert_notification(
        &limited,
        "x\r\n&attachment=20240102030405_01_a.txt|20240102030405_02_b.txt;\r\n",
    );

    let ignored = queue.destination(CUSTOMER_TOOL, "20240102030500.temp");
    queue
        .queue("2", notification_payload("INCIDENT", "AA", "IM1", &ignored, "y\n"))
        .await;

    let config = test_config(&queue.db_path, "UTC", r#"attachments = "ignore""#);
    NotificationExtractor::new(&config)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_notification(&ignored, "y\r\n");
}

#[tokio::test]
async fn test_attachment_window_follows_configured_time_zone() {
    let queue = TestQueue::new().await;
    let dest = queue.destination(CUSTOMER_TOOL, "20240102030405.temp");
    queue
        .queue("1", notification_payload("INCIDENT", "AA", "IM1", &dest, "x\n"))
        .await;
    // Stored as Warsaw wall-clock time, one hour ahead of UTC in January
    queue
        .store_attachment("IM1", "local.txt", "u1", false, &[b"local"], at(4, 4, 6))
        .await;

    let config = test_config(&queue.db_path, "Europe/Warsaw", "");
    NotificationExtractor::new(&config)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_notification(&dest, "x\r\n&attachment=20240102030405_01_local.txt;\r\n");
}

#[tokio::test]
async fn test_empty_queue_is_a_successful_run() {
    let queue = TestQueue::new().await;

    let config = test_config(&queue.db_path, "UTC", "");
    let summary = NotificationExtractor::new(&config)
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.total, 0);
}

#[tokio::test]
async fn test_missing_database_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir.path().join("nope").join("eventout.db"), "UTC", "");

    let err = NotificationExtractor::new(&config).await.err().unwrap();

    assert!(err.is_fatal());
}
