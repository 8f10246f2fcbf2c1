//! Plain records decoded from a BAI file
//!
//! These carry no behaviour beyond construction and display; parsing lives
//! in [`crate::core::catalog`] and [`crate::core::loader`].

use std::collections::HashMap;
use std::fmt;

/// Byte span of one reference's block within the index file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Offset of the reference's `n_bin` field
    pub start_offset: u64,
    /// Offset just past the reference's last linear interval
    pub end_offset: u64,
    /// Number of bins, including the unmapped pseudo-bin when present
    pub n_bins: i32,
}

/// A contiguous virtual-offset range of alignment records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chunk {
    pub begin: u64,
    pub end: u64,
}

impl Chunk {
    pub fn new(begin: u64, end: u64) -> Self {
        Self { begin, end }
    }
}

/// Fully parsed bins and linear index of one reference
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceBlock {
    /// Bin id -> chunks in on-file order. Never holds the unmapped pseudo-bin.
    pub bins: HashMap<u32, Vec<Chunk>>,
    /// Virtual offset of the first read in each 16 kbp window
    pub intervals: Vec<u64>,
}

/// Read counts stored in the unmapped pseudo-bin of a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmappedStats {
    pub unmapped_begin: u64,
    pub unmapped_end: u64,
    pub n_mapped: u64,
    pub n_unmapped: u64,
}

/// BGZF virtual file offset
///
/// The upper 48 bits locate a compressed block in the alignment file, the
/// lower 16 bits an offset into that block once decompressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VirtualOffset(u64);

impl VirtualOffset {
    pub fn new(compressed: u64, uncompressed: u16) -> Self {
        Self((compressed << 16) | uncompressed as u64)
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }

    /// Byte offset of the compressed block
    pub fn compressed(self) -> u64 {
        self.0 >> 16
    }

    /// Offset within the decompressed block
    pub fn uncompressed(self) -> u16 {
        (self.0 & 0xffff) as u16
    }
}

impl From<u64> for VirtualOffset {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for VirtualOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.compressed(), self.uncompressed())
    }
}
