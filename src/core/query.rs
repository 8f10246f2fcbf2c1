//! Region query resolution
//!
//! Turns `[start, stop)` on one reference into merged virtual-offset ranges
//! using the bins overlapping the region and the linear index as a lower and
//! upper bound. The result is a superset: callers must still check decoded
//! record coordinates.

use crate::core::binning::{reg2bins, Reg2Bins, LINEAR_INDEX_WINDOW};
use crate::core::error::BaiResult;
use crate::core::records::{Chunk, ReferenceBlock};

/// Validated region with its candidate bins
#[derive(Debug, Clone)]
pub struct QueryPlan {
    start: i64,
    stop: i64,
    bins: Reg2Bins,
}

impl QueryPlan {
    /// Fails with `InvalidArgument` for a malformed region.
    pub fn new(start: i64, stop: i64) -> BaiResult<Self> {
        let bins = reg2bins(start, stop)?;
        Ok(Self { start, stop, bins })
    }

    /// Linear-index bounds `(start_offset, end_offset)`, or `None` when the
    /// reference has no linear index.
    ///
    /// A stop past the last window yields `intervals[last] + 1`, which admits
    /// everything up to the last indexed read.
    pub fn linear_bounds(&self, intervals: &[u64]) -> Option<(u64, u64)> {
        let last = *intervals.last()?;
        let start_window = self.start as u64 / LINEAR_INDEX_WINDOW;
        let stop_window = (self.stop as u64).div_ceil(LINEAR_INDEX_WINDOW);

        let start_offset = intervals
            .get(start_window as usize)
            .copied()
            .unwrap_or(last);
        let end_offset = intervals
            .get(stop_window as usize)
            .copied()
            .unwrap_or_else(|| last.saturating_add(1));
        Some((start_offset, end_offset))
    }

    /// Resolve against a loaded block.
    ///
    /// Pairs come out in bin traversal order (coarse to fine) and on-file
    /// chunk order, not sorted by offset.
    pub fn resolve(&self, block: &ReferenceBlock) -> Vec<(u64, u64)> {
        let Some((start_offset, end_offset)) = self.linear_bounds(&block.intervals) else {
            return Vec::new();
        };

        let mut merger = ChunkMerger::default();
        for bin_id in self.bins.clone() {
            let Some(chunks) = block.bins.get(&bin_id) else {
                continue;
            };
            for chunk in chunks {
                if start_offset <= chunk.begin && chunk.end < end_offset {
                    merger.push(*chunk);
                }
            }
        }
        merger.finish()
    }
}

/// Coalesces a stream of chunks where each begins exactly at the previous
/// one's end.
#[derive(Debug, Default)]
pub struct ChunkMerger {
    current: Option<Chunk>,
    merged: Vec<(u64, u64)>,
}

impl ChunkMerger {
    pub fn push(&mut self, chunk: Chunk) {
        match self.current.as_mut() {
            Some(run) if chunk.begin == run.end => run.end = chunk.end,
            Some(run) => {
                self.merged.push((run.begin, run.end));
                self.current = Some(chunk);
            }
            None => self.current = Some(chunk),
        }
    }

    /// Flush the open run; an empty stream yields no pairs.
    pub fn finish(mut self) -> Vec<(u64, u64)> {
        if let Some(run) = self.current.take() {
            self.merged.push((run.begin, run.end));
        }
        self.merged
    }
}
