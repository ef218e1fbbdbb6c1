//! Assertions over files written by the extractor

use std::path::Path;

/// Assert a notification file holds a BOM followed by exactly `expected`
pub fn assert_notification(path: &Path, expected: &str) {
    let bytes = std::fs::read(path)
        .unwrap_or_else(|e| panic!("notification {} not written: {}", path.display(), e));
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF], "missing BOM in {}", path.display());
    assert_eq!(String::from_utf8_lossy(&bytes[3..]), expected);
}

/// Assert an attachment file exists with the given content
pub fn assert_attachment(dir: &Path, name: &str, expected: &[u8]) {
    let path = dir.join(name);
    let bytes = std::fs::read(&path)
        .unwrap_or_else(|e| panic!("attachment {} not written: {}", path.display(), e));
    assert_eq!(bytes, expected, "content of {}", name);
}
