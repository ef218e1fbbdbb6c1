//! Attachment reconstruction from stored segments
//!
//! Segment rows arrive ordered by `(mod_time, uid, segment)`. Consecutive rows
//! sharing `(file_name, uid, compressed)` form one attachment; no re-sorting is
//! done, so rows of one attachment must be contiguous.
//!
//! Every segment starts with a variable-length header. The byte at offset 7
//! tells its length:
//!
//! | indicator | header length |
//! |-----------|---------------|
//! | `0x2D`    | 9 bytes       |
//! | `0x2E`    | 10 bytes      |
//! | other     | 0 bytes       |
//!
//! The zero-length fallback has never been observed on real data and is kept
//! as-is. Headers are stripped, the remainders concatenated in row order and,
//! for compressed attachments, inflated as a zlib stream.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::AttachmentError;
use crate::types::{Attachment, AttachmentSegmentRow};

/// Offset of the header length indicator inside a segment
pub const INDICATOR_OFFSET: usize = 7;

/// Indicator of a 9-byte segment header
pub const SHORT_HEADER_INDICATOR: u8 = 0x2D;

/// Indicator of a 10-byte segment header
pub const LONG_HEADER_INDICATOR: u8 = 0x2E;

const SHORT_HEADER_LEN: usize = 9;
const LONG_HEADER_LEN: usize = 10;

/// Header length announced by a segment's indicator byte.
///
/// Segments too short to carry an indicator have no header.
pub fn header_len(segment: &[u8]) -> usize {
    match segment.get(INDICATOR_OFFSET) {
        Some(&SHORT_HEADER_INDICATOR) => SHORT_HEADER_LEN,
        Some(&LONG_HEADER_INDICATOR) => LONG_HEADER_LEN,
        _ => 0,
    }
}

/// Segment payload with its header removed
pub fn strip_header(segment: &[u8]) -> Option<&[u8]> {
    segment.get(header_len(segment)..)
}

/// Replace characters that cannot appear in saved file names
pub fn sanitize_file_name(name: &str) -> String {
    name.replace('?', "_")
}

/// Consecutive rows belonging to one attachment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentGroup<'a> {
    rows: &'a [AttachmentSegmentRow],
}

impl<'a> SegmentGroup<'a> {
    /// Rows of this group, in source order
    pub fn rows(&self) -> &'a [AttachmentSegmentRow] {
        self.rows
    }

    fn first(&self) -> &'a AttachmentSegmentRow {
        // Groups are never empty
        &self.rows[0]
    }

    /// Concatenate the header-stripped segments in order
    pub fn payload(&self) -> Result<Vec<u8>, AttachmentError> {
        let first = self.first();
        let total: usize = self.rows.iter().map(|r| r.data.len()).sum();
        let mut buf = Vec::with_capacity(total);

        for (index, row) in self.rows.iter().enumerate() {
            let header = header_len(&row.data);
            let body =
                strip_header(&row.data).ok_or_else(|| AttachmentError::TruncatedSegment {
                    file_name: first.file_name.clone(),
                    segment: index,
                    len: row.data.len(),
                    header,
                })?;
            tracing::trace!(
                file_name = %first.file_name,
                segment = index,
                header_len = header,
                payload_len = body.len(),
                "Segment header stripped"
            );
            buf.extend_from_slice(body);
        }

        Ok(buf)
    }

    /// Build the attachment: strip headers, concatenate, inflate when compressed.
    pub fn finalize(&self) -> Result<Attachment, AttachmentError> {
        let first = self.first();
        let payload = self.payload()?;

        let content = if first.compressed {
            inflate(&payload).map_err(|e| AttachmentError::Inflate {
                file_name: first.file_name.clone(),
                reason: e.to_string(),
            })?
        } else {
            payload
        };

        Ok(Attachment {
            file_name: sanitize_file_name(&first.file_name),
            uid: first.uid.clone(),
            compressed: first.compressed,
            content,
            normal_size: first.normal_size,
            compressed_size: first.compressed_size,
        })
    }
}

/// Split ordered rows into attachment groups.
///
/// A new group starts whenever `(file_name, uid, compressed)` differs from the
/// previous row.
pub fn group_segments(rows: &[AttachmentSegmentRow]) -> Vec<SegmentGroup<'_>> {
    rows.chunk_by(|a, b| {
        a.file_name == b.file_name && a.uid == b.uid && a.compressed == b.compressed
    })
    .map(|rows| SegmentGroup { rows })
    .collect()
}

/// Reconstruct every attachment in `rows`.
///
/// Each entry corresponds to one group, in source order, so a failed group
/// keeps its position (and its sequence number when written).
pub fn assemble(rows: &[AttachmentSegmentRow]) -> Vec<Result<Attachment, AttachmentError>> {
    group_segments(rows)
        .iter()
        .map(SegmentGroup::finalize)
        .collect()
}

/// Inflate a zlib stream up to its end marker
fn inflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(data.len().saturating_mul(2));
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
