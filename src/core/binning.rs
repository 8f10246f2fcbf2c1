//! UCSC-style hierarchical binning scheme
//!
//! Six nested levels cover 512 Mbp:
//!
//! | level | bin ids       | bin size |
//! |-------|---------------|----------|
//! | 0     | 0             | 512 Mbp  |
//! | 1     | 1..=8         | 64 Mbp   |
//! | 2     | 9..=72        | 8 Mbp    |
//! | 3     | 73..=584      | 1 Mbp    |
//! | 4     | 585..=4680    | 128 kbp  |
//! | 5     | 4681..=37448  | 16 kbp   |
//!
//! Bin 37450 is reserved for per-reference unmapped read statistics.

use crate::core::error::{BaiError, BaiResult};

/// Largest coordinate the scheme can address
pub const MAX_COORDINATE: i64 = (1 << 29) - 1;

/// Size of a linear-index window in bp
pub const LINEAR_INDEX_WINDOW: u64 = 16384;

/// Pseudo-bin holding unmapped read statistics
pub const UNMAPPED_BIN: u32 = 37450;

/// (first bin id, shift) per level, coarsest first
const LEVELS: [(u32, u32); 6] = [(0, 29), (1, 26), (9, 23), (73, 20), (585, 17), (4681, 14)];

/// Smallest bin fully containing the half-open region `[beg, end)`.
pub fn reg2bin(beg: i64, end: i64) -> u32 {
    let end = end - 1;
    for &(base, shift) in LEVELS.iter().rev() {
        if shift == 29 {
            break;
        }
        if beg >> shift == end >> shift {
            return base + (beg >> shift) as u32;
        }
    }
    0
}

/// Every bin that may overlap `[rbeg, rend)`, coarsest level first and
/// ascending within a level.
///
/// Fails with `InvalidArgument` unless `0 <= rbeg <= rend <= 2^29 - 1`.
pub fn reg2bins(rbeg: i64, rend: i64) -> BaiResult<Reg2Bins> {
    if !(0 <= rbeg && rbeg <= rend && rend <= MAX_COORDINATE) {
        return Err(BaiError::InvalidArgument(format!(
            "Invalid region {}, {}",
            rbeg, rend
        )));
    }
    Ok(Reg2Bins {
        rbeg,
        rend,
        level: 0,
        next: None,
    })
}

/// Lazy iterator returned by [`reg2bins`]
#[derive(Debug, Clone)]
pub struct Reg2Bins {
    rbeg: i64,
    rend: i64,
    level: usize,
    // (next bin id, last bin id) within the current level
    next: Option<(u32, u32)>,
}

impl Reg2Bins {
    fn level_range(&self, level: usize) -> (u32, u32) {
        let (base, shift) = LEVELS[level];
        let i = if self.rbeg > 0 { self.rbeg >> shift } else { 0 };
        let j = if self.rend < MAX_COORDINATE {
            self.rend >> shift
        } else {
            MAX_COORDINATE >> shift
        };
        (base + i as u32, base + j as u32)
    }
}

impl Iterator for Reg2Bins {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        loop {
            match self.next {
                Some((bin, last)) if bin <= last => {
                    self.next = Some((bin + 1, last));
                    return Some(bin);
                }
                _ => {
                    if self.level == LEVELS.len() {
                        return None;
                    }
                    self.next = Some(self.level_range(self.level));
                    self.level += 1;
                }
            }
        }
    }
}
