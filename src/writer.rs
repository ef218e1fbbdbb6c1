//! Notification and attachment output
//!
//! A notification is written to its destination path as UTF-8 with a byte
//! order mark. When attachments were saved next to it, a trailing manifest
//! line lists their file names:
//!
//! ```text
//! <BOM>body...&attachment=20240102030405_01_scan.pdf|20240102030405_02_log.txt;\r\n
//! ```

use std::path::{Path, PathBuf};

use crate::error::{AttachmentError, Result};
use crate::types::{Attachment, ParsedNotification};

/// UTF-8 byte order mark written before every notification body
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Suffix of notification file names replaced by the attachment sequence number
pub const SEQUENCE_MARKER: &str = ".temp";

/// Directory a notification and its attachments are written to
pub fn notification_dir(notification: &ParsedNotification) -> PathBuf {
    match notification.directory() {
        "" => PathBuf::from("."),
        dir => PathBuf::from(dir),
    }
}

/// Create `dir` and its parents.
///
/// Concurrent record tasks may race to create the same parents; a directory
/// that already exists is not an error.
pub async fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    match tokio::fs::create_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            match tokio::fs::metadata(dir).await {
                Ok(meta) if meta.is_dir() => Ok(()),
                _ => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}

/// File name for the `sequence`-th (1-based) attachment of a notification.
///
/// `20240102030405.temp` + 3 + `scan.pdf` gives `20240102030405_03_scan.pdf`.
pub fn attachment_file_name(
    notification_file_name: &str,
    sequence: usize,
    attachment_name: &str,
) -> String {
    let number = format!("_{:02}", sequence);
    let base = if notification_file_name.contains(SEQUENCE_MARKER) {
        notification_file_name.replace(SEQUENCE_MARKER, &number)
    } else {
        format!("{}{}", notification_file_name, number)
    };
    format!("{}_{}", base, attachment_name)
}

/// Trailing manifest line, present only when at least one attachment was saved
pub fn manifest_line(saved: &[String]) -> Option<String> {
    if saved.is_empty() {
        return None;
    }
    Some(format!("&attachment={};\r\n", saved.join("|")))
}

/// Write one attachment next to its notification.
///
/// The returned name is the attachment's saved file name, assigned here from
/// the notification file name and `sequence`. It is what the manifest lists.
pub async fn save_attachment(
    notification: &ParsedNotification,
    sequence: usize,
    attachment: &Attachment,
) -> std::result::Result<String, AttachmentError> {
    let dir = notification_dir(notification);
    let saved_name = attachment_file_name(&notification.file_name, sequence, &attachment.file_name);
    let path = dir.join(&saved_name);

    let persist_error = |e: std::io::Error| AttachmentError::Persist {
        path: path.clone(),
        reason: e.to_string(),
    };

    ensure_dir(&dir).await.map_err(persist_error)?;
    tokio::fs::write(&path, &attachment.content)
        .await
        .map_err(persist_error)?;

    tracing::debug!(
        path = %path.display(),
        size = attachment.content.len(),
        "Attachment saved"
    );

    Ok(saved_name)
}

/// Write the notification body and its attachment manifest
pub async fn save_notification(
    notification: &ParsedNotification,
    saved_attachments: &[String],
) -> Result<PathBuf> {
    let dir = notification_dir(notification);
    ensure_dir(&dir).await?;

    let manifest = manifest_line(saved_attachments);
    let mut content = Vec::with_capacity(
        UTF8_BOM.len()
            + notification.body.len()
            + manifest.as_ref().map_or(0, String::len),
    );
    content.extend_from_slice(&UTF8_BOM);
    content.extend_from_slice(notification.body.as_bytes());
    if let Some(line) = manifest {
        content.extend_from_slice(line.as_bytes());
    }

    let path = dir.join(&notification.file_name);
    tokio::fs::write(&path, content).await?;

    Ok(path)
}
