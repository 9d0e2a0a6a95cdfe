//! Wall-clock timestamps
//!
//! Timestamps are informational (trade records, depth snapshots, FIFO
//! tie-break metadata); ordering within a book is defined by critical
//! section entry, not by clock reads.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as Unix nanoseconds.
pub fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}
