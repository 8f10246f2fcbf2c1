//! Core BAI index functionality
//!
//! This module contains the byte cursor, binning scheme, catalog pass,
//! reference block loader and cache, and the query engine.

mod bai;
pub mod binning;
mod cache;
pub mod catalog;
mod error;
pub mod io;
pub mod loader;
pub mod query;
mod records;
pub mod synth;

pub use bai::{index_path_for, BaiIndex, IndexOptions, BAI_SUFFIX};
pub use binning::{reg2bin, reg2bins, Reg2Bins, LINEAR_INDEX_WINDOW, MAX_COORDINATE, UNMAPPED_BIN};
pub use cache::{ReferenceCache, DEFAULT_CACHE_CAPACITY};
pub use catalog::{build_catalog, Catalog, UnmappedStatsStore, BAI_MAGIC};
pub use error::{BaiError, BaiResult};
pub use io::{
    ByteCursor, IoStrategy, MappedReader, SmartReader, Whence,
    DEFAULT_BUFFER_SIZE, LARGE_BUFFER_SIZE, MMAP_THRESHOLD,
};
pub use loader::load_reference;
pub use query::{ChunkMerger, QueryPlan};
pub use records::{CatalogEntry, Chunk, ReferenceBlock, UnmappedStats, VirtualOffset};
