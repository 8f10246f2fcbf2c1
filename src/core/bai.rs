//! The open BAI index
//!
//! Opening walks the file once to build a [`Catalog`]; reference blocks are
//! parsed on demand and kept in a bounded [`ReferenceCache`].
//!
//! # Shared cursor
//!
//! One cursor serves catalog construction, block loading and the raw
//! [`BaiIndex::seek`]/[`BaiIndex::read`]/[`BaiIndex::tell`] passthrough. A
//! query that misses the cache moves it; a cache hit leaves it untouched.
//! Every operation takes `&mut self`, so sharing one index across threads
//! needs external serialisation.

use crate::core::cache::{ReferenceCache, DEFAULT_CACHE_CAPACITY};
use crate::core::catalog::{build_catalog, Catalog};
use crate::core::error::{BaiError, BaiResult};
use crate::core::io::{ByteCursor, IoStrategy, SmartReader, Whence};
use crate::core::loader::load_reference;
use crate::core::query::QueryPlan;
use crate::core::records::{CatalogEntry, ReferenceBlock, UnmappedStats};
use log::debug;
use std::io::{Read, Seek};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Suffix appended to an alignment path to find its index
pub const BAI_SUFFIX: &str = ".bai";

/// Options controlling how an index is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    /// Maximum number of parsed reference blocks kept in memory
    pub cache_capacity: NonZeroUsize,
    /// How the index file is read
    pub io_strategy: IoStrategy,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            cache_capacity: NonZeroUsize::new(DEFAULT_CACHE_CAPACITY)
                .unwrap_or(NonZeroUsize::MIN),
            io_strategy: IoStrategy::Auto,
        }
    }
}

impl IndexOptions {
    pub fn with_cache_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_io_strategy(mut self, strategy: IoStrategy) -> Self {
        self.io_strategy = strategy;
        self
    }
}

/// Path of the index accompanying `alignment`
pub fn index_path_for<P: AsRef<Path>>(alignment: P) -> PathBuf {
    let mut path = alignment.as_ref().as_os_str().to_owned();
    path.push(BAI_SUFFIX);
    PathBuf::from(path)
}

/// An open BAM index
///
/// # Example
/// ```ignore
/// let mut index = BaiIndex::open("sample.bam.bai")?;
/// for (begin, end) in index.query(2, 1_000_000, 2_000_000)? {
///     // decode the alignment file between the two virtual offsets
/// }
/// ```
pub struct BaiIndex<R = SmartReader> {
    cursor: ByteCursor<R>,
    catalog: Catalog,
    cache: ReferenceCache,
}

impl BaiIndex<SmartReader> {
    /// Open an index file with default options
    pub fn open<P: AsRef<Path>>(path: P) -> BaiResult<Self> {
        Self::open_with(path, IndexOptions::default())
    }

    /// Open an index file
    ///
    /// Fails with `FileNotFound` if `path` is not an existing file.
    pub fn open_with<P: AsRef<Path>>(path: P, options: IndexOptions) -> BaiResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(BaiError::FileNotFound(path.to_path_buf()));
        }
        debug!("Opening BAI file: {:?}", path);
        let reader = SmartReader::open(path, options.io_strategy)?;
        Self::from_reader(reader, options)
    }

    /// Open the index of an alignment file, `<alignment>.bai`
    pub fn open_for_alignment<P: AsRef<Path>>(alignment: P) -> BaiResult<Self> {
        Self::open(index_path_for(alignment))
    }
}

impl<R: Read + Seek> BaiIndex<R> {
    /// Build an index over any seekable source
    pub fn from_reader(reader: R, options: IndexOptions) -> BaiResult<Self> {
        let mut cursor = ByteCursor::new(reader)?;
        let catalog = build_catalog(&mut cursor)?;
        Ok(Self {
            cursor,
            catalog,
            cache: ReferenceCache::new(options.cache_capacity),
        })
    }

    /// Number of references in the index
    pub fn n_refs(&self) -> usize {
        self.catalog.entries.len()
    }

    /// Reads with no coordinate, if the trailer is present
    pub fn n_no_coor(&self) -> Option<u64> {
        self.catalog.n_no_coor
    }

    /// Cursor position recorded at the end of catalog construction
    pub fn end_offset(&self) -> u64 {
        self.catalog.end_offset
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog.entries
    }

    pub fn catalog_entry(&self, ref_id: usize) -> Option<&CatalogEntry> {
        self.catalog.entries.get(ref_id)
    }

    /// Unmapped read statistics of `ref_id`
    pub fn unmapped(&self, ref_id: usize) -> Option<&UnmappedStats> {
        self.catalog.unmapped.get(ref_id)
    }

    /// Whether the block of `ref_id` is cached; does not affect recency
    pub fn is_cached(&self, ref_id: usize) -> bool {
        self.cache.contains(ref_id)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Number of full reference parses performed so far
    pub fn loads(&self) -> u64 {
        self.cache.loads()
    }

    /// The parsed block of `ref_id`, loading it on a cache miss
    pub fn reference(&mut self, ref_id: usize) -> BaiResult<&ReferenceBlock> {
        let entry = *self.catalog.entries.get(ref_id).ok_or_else(|| {
            BaiError::InvalidArgument(format!(
                "reference id {} out of range (n_ref = {})",
                ref_id,
                self.catalog.entries.len()
            ))
        })?;
        let cursor = &mut self.cursor;
        let unmapped = &mut self.catalog.unmapped;
        self.cache
            .get_or_load(ref_id, || load_reference(cursor, ref_id, &entry, unmapped))
    }

    /// Virtual-offset ranges that may hold reads overlapping `[start, stop)`
    /// on `ref_id`.
    ///
    /// The region is validated before any I/O. The ranges are a superset;
    /// callers must filter decoded records by their coordinates.
    pub fn query(&mut self, ref_id: usize, start: i64, stop: i64) -> BaiResult<Vec<(u64, u64)>> {
        let plan = QueryPlan::new(start, stop)?;
        let block = self.reference(ref_id)?;
        Ok(plan.resolve(block))
    }

    /// Move the raw cursor; see [`ByteCursor::seek`]
    pub fn seek(&mut self, offset: Option<i64>, whence: Whence) -> BaiResult<u64> {
        self.cursor.seek(offset, whence)
    }

    /// Read up to `n` raw bytes at the cursor
    pub fn read(&mut self, n: usize) -> BaiResult<Vec<u8>> {
        self.cursor.read(n)
    }

    /// Read all remaining raw bytes
    pub fn read_to_end(&mut self) -> BaiResult<Vec<u8>> {
        self.cursor.read_to_end()
    }

    pub fn tell(&mut self) -> BaiResult<u64> {
        self.cursor.tell()
    }
}
