//! FastBai - BAM index (BAI) parsing and region queries
//!
//! Translates a genomic region into the virtual-offset ranges of a BAM file
//! that must be decoded to find every overlapping read.
//!
//! # Features
//!
//! - One sequential catalog pass on open; reference blocks parsed lazily
//! - Bounded LRU cache of parsed reference blocks
//! - Six-level UCSC binning scheme (`reg2bin`, `reg2bins`)
//! - Chunk merging guided by the 16 kbp linear index
//!
//! # Example
//!
//! ```ignore
//! use fast_bai::BaiIndex;
//!
//! let mut index = BaiIndex::open_for_alignment("sample.bam")?;
//! println!("{} references", index.n_refs());
//!
//! for (begin, end) in index.query(0, 1_000_000, 2_000_000)? {
//!     println!("{} - {}", begin, end);
//! }
//! ```

pub mod core;

// Re-export commonly used types
pub use core::{
    index_path_for, reg2bin, reg2bins, BaiError, BaiIndex, BaiResult, CatalogEntry, Chunk,
    IndexOptions, IoStrategy, ReferenceBlock, UnmappedStats, VirtualOffset, Whence,
};
