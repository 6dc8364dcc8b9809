//! Contiguous near-equal partitioning.
//!
//! Both activity slices (engine) and event shards (event manager) use the
//! same rule: `parts = min(max_parts, len)` contiguous ranges of
//! `len / parts` items each, with the remainder folded into the last range.
//!
//! ```text
//! split_even(21, 5) → [0..4, 4..8, 8..12, 12..16, 16..21]
//! split_even(3, 5)  → [0..1, 1..2, 2..3]
//! ```

use std::ops::Range;

/// Split `0..len` into at most `max_parts` contiguous ranges.
///
/// Returns an empty vec if `len == 0` or `max_parts == 0`.
pub fn split_even(len: usize, max_parts: usize) -> Vec<Range<usize>> {
    let parts = max_parts.min(len);
    if parts == 0 {
        return Vec::new();
    }
    let block = len / parts;
    (0..parts)
        .map(|i| {
            let start = i * block;
            let end = if i + 1 == parts { len } else { start + block };
            start..end
        })
        .collect()
}
