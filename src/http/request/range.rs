//! `Range` header parsing.
//!
//! Grammar: `bytes=<spec>[,<spec>...]` where each spec is `start-end`,
//! `start-` (to the end) or `-suffix` (the last `suffix` bytes). Specs that
//! cannot be satisfied for the given size are dropped; if none remain the
//! whole header is unsatisfiable.

use crate::error::RangeError;

/// An inclusive byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

#[allow(clippy::len_without_is_empty)]
impl ByteRange {
    /// Number of bytes covered. Never zero, the range is inclusive.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a representation of `size` bytes.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// Parse a `Range` header against a representation of `size` bytes.
pub fn parse_range(header: &str, size: u64) -> Result<Vec<ByteRange>, RangeError> {
    let specs = header
        .trim()
        .strip_prefix("bytes=")
        .ok_or_else(|| RangeError::Malformed("range unit must be bytes".to_string()))?;

    let size = i128::from(size);
    let mut ranges = Vec::new();

    for spec in specs.split(',') {
        let (start, end) = spec
            .split_once('-')
            .ok_or_else(|| RangeError::Malformed(format!("missing '-' in {:?}", spec.trim())))?;
        let start = parse_bound(start)?;
        let end = parse_bound(end)?;

        let (start, end) = match (start, end) {
            (None, None) => {
                return Err(RangeError::Malformed(format!(
                    "no bounds in {:?}",
                    spec.trim()
                )))
            }
            (None, Some(suffix)) => (size - suffix, size - 1),
            (Some(start), None) => (start, size - 1),
            (Some(start), Some(end)) => (start, end),
        };

        if start > end || start < 0 || end >= size {
            continue;
        }
        ranges.push(ByteRange {
            start: start as u64,
            end: end as u64,
        });
    }

    if ranges.is_empty() {
        return Err(RangeError::Unsatisfiable);
    }
    Ok(ranges)
}

fn parse_bound(raw: &str) -> Result<Option<i128>, RangeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::Malformed(format!("invalid bound {:?}", raw)));
    }
    raw.parse::<u64>()
        .map(|v| Some(i128::from(v)))
        .map_err(|_| RangeError::Malformed(format!("bound {:?} out of range", raw)))
}
