//! Output partitioning across jobs.
//!
//! Jobs own contiguous bands of block rows. Band boundaries fall on whole
//! rows of blocks so every job can compress its band independently, and the
//! last band runs to the end of the caller's capacity so that the ranges
//! cover the whole output buffer.
//!
//! ```text
//! 8 block rows, 3 jobs:
//!
//! job 0: rows 0..2  ─► bytes [0,           2 * row)
//! job 1: rows 2..5  ─► bytes [2 * row,     5 * row)
//! job 2: rows 5..8  ─► bytes [5 * row,     capacity)
//! ```

use std::ops::Range;

use super::EncoderConfig;
use crate::footprint::{blocks_along, BLOCK_BYTES};

/// Split `[0, capacity)` into `job_count` bands of block rows.
///
/// When there are more jobs than block rows some bands are empty. Ranges are
/// clamped to `capacity`.
pub fn block_rows(
    config: &EncoderConfig,
    width: u32,
    height: u32,
    capacity: usize,
    job_count: usize,
) -> Vec<Range<usize>> {
    if job_count == 0 {
        return Vec::new();
    }

    let row_bytes = blocks_along(width, config.block_width) * BLOCK_BYTES;
    let rows = blocks_along(height, config.block_height);
    let boundary = |job: usize| ((rows * job / job_count) * row_bytes).min(capacity);

    (0..job_count)
        .map(|job| {
            let start = boundary(job);
            let end = if job + 1 == job_count {
                capacity
            } else {
                boundary(job + 1)
            };
            start..end
        })
        .collect()
}

/// Reason a partition cannot be used to split an output buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartitionError {
    #[error("expected {expected} ranges, got {actual}")]
    WrongCount { expected: usize, actual: usize },

    #[error("range {job} ({start}..{end}) is inverted")]
    Inverted { job: usize, start: usize, end: usize },

    #[error("range {job} starts at {start} before the previous range ends at {previous_end}")]
    Overlap {
        job: usize,
        start: usize,
        previous_end: usize,
    },

    #[error("range {job} ends at {end}, beyond capacity {capacity}")]
    OutOfBounds {
        job: usize,
        end: usize,
        capacity: usize,
    },
}

/// Check that `ranges` are sorted, disjoint and inside `[0, capacity)`.
pub fn validate(
    ranges: &[Range<usize>],
    capacity: usize,
    job_count: usize,
) -> Result<(), PartitionError> {
    if ranges.len() != job_count {
        return Err(PartitionError::WrongCount {
            expected: job_count,
            actual: ranges.len(),
        });
    }

    let mut previous_end = 0;
    for (job, range) in ranges.iter().enumerate() {
        if range.start > range.end {
            return Err(PartitionError::Inverted {
                job,
                start: range.start,
                end: range.end,
            });
        }
        if range.start < previous_end {
            return Err(PartitionError::Overlap {
                job,
                start: range.start,
                previous_end,
            });
        }
        if range.end > capacity {
            return Err(PartitionError::OutOfBounds {
                job,
                end: range.end,
                capacity,
            });
        }
        previous_end = range.end;
    }

    Ok(())
}

/// Split `output` into one mutable slice per range.
///
/// `ranges` must already have passed [`validate`]. Gaps between ranges are
/// left untouched.
pub fn split_output<'a>(
    mut output: &'a mut [u8],
    ranges: &[Range<usize>],
) -> Vec<(usize, &'a mut [u8])> {
    let mut consumed = 0;
    let mut slices = Vec::with_capacity(ranges.len());

    for range in ranges {
        let (_, rest) = std::mem::take(&mut output).split_at_mut(range.start - consumed);
        let (owned, rest) = rest.split_at_mut(range.end - range.start);
        slices.push((range.start, owned));
        output = rest;
        consumed = range.end;
    }

    slices
}
