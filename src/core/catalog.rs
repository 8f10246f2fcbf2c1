//! Header decoding and the one-pass reference catalog
//!
//! On open the whole index is walked once, front to back, recording where
//! each reference block starts and ends without decoding chunk data. The
//! walk is only ever driven from [`build_catalog`]; it relies on the cursor
//! sitting exactly at the start of each successive reference.

use crate::core::binning::UNMAPPED_BIN;
use crate::core::error::{BaiError, BaiResult};
use crate::core::io::ByteCursor;
use crate::core::loader::{read_count, read_unmapped, CHUNK_SIZE, INTERVAL_SIZE};
use crate::core::records::{CatalogEntry, UnmappedStats};
use log::{debug, trace};
use std::collections::BTreeMap;
use std::io::{Read, Seek};

/// BAI file format magic string
pub const BAI_MAGIC: &[u8; 4] = b"BAI\x01";

/// Unmapped read statistics keyed by reference id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnmappedStatsStore {
    stats: BTreeMap<usize, UnmappedStats>,
}

impl UnmappedStatsStore {
    pub fn insert(&mut self, ref_id: usize, stats: UnmappedStats) {
        self.stats.insert(ref_id, stats);
    }

    pub fn get(&self, ref_id: usize) -> Option<&UnmappedStats> {
        self.stats.get(&ref_id)
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Entries in ascending reference id order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &UnmappedStats)> {
        self.stats.iter().map(|(id, s)| (*id, s))
    }
}

/// Everything learned from the sequential pass over an index
#[derive(Debug, Clone)]
pub struct Catalog {
    /// One entry per reference, ordered by reference id
    pub entries: Vec<CatalogEntry>,
    pub unmapped: UnmappedStatsStore,
    /// Reads with no coordinate, when the optional trailer is present
    pub n_no_coor: Option<u64>,
    /// Cursor position once the pass finished
    pub end_offset: u64,
}

/// Decode the magic and reference count.
fn read_header<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> BaiResult<usize> {
    let magic = cursor.read_bytes::<4>("magic")?;
    if &magic != BAI_MAGIC {
        return Err(BaiError::Format(format!(
            "wrong BAI magic header: {:?}",
            magic
        )));
    }
    read_count(cursor, "n_ref")
}

/// Record the byte span of the reference block under the cursor, skipping
/// over chunk and interval data.
fn index_reference<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    ref_id: usize,
    unmapped: &mut UnmappedStatsStore,
) -> BaiResult<CatalogEntry> {
    let start_offset = cursor.tell()?;
    let n_bins = cursor.read_i32("n_bin")?;
    if n_bins < 0 {
        return Err(BaiError::Format(format!("negative n_bin: {}", n_bins)));
    }

    for _ in 0..n_bins {
        let bin_id = cursor.read_i32("bin id")? as u32;
        let n_chunks = cursor.read_i32("n_chunk")?;

        if bin_id == UNMAPPED_BIN {
            unmapped.insert(ref_id, read_unmapped(cursor, n_chunks)?);
        } else if n_chunks < 0 {
            return Err(BaiError::Format(format!("negative n_chunk: {}", n_chunks)));
        } else if n_chunks > 0 {
            cursor.skip(n_chunks as u64 * CHUNK_SIZE, "chunks")?;
        }
    }

    let n_intervals = read_count(cursor, "n_intv")?;
    cursor.skip(n_intervals as u64 * INTERVAL_SIZE, "linear index")?;

    let end_offset = cursor.tell()?;
    trace!(
        "Reference {}: bytes {}..{}, {} bins",
        ref_id,
        start_offset,
        end_offset,
        n_bins
    );

    Ok(CatalogEntry {
        start_offset,
        end_offset,
        n_bins,
    })
}

/// Walk the whole index from offset 0 and build its catalog.
pub fn build_catalog<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> BaiResult<Catalog> {
    cursor.seek_to(0)?;
    let n_refs = read_header(cursor)?;

    let mut entries = Vec::with_capacity(n_refs.min(1 << 16));
    let mut unmapped = UnmappedStatsStore::default();
    for ref_id in 0..n_refs {
        entries.push(index_reference(cursor, ref_id, &mut unmapped)?);
    }

    let n_no_coor = cursor.read_optional_u64("n_no_coor")?;
    let end_offset = cursor.tell()?;

    debug!(
        "Cataloged {} references ({} with unmapped stats), n_no_coor={:?}, {} bytes",
        entries.len(),
        unmapped.len(),
        n_no_coor,
        end_offset
    );

    Ok(Catalog {
        entries,
        unmapped,
        n_no_coor,
        end_offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::synth::{IndexBuilder, ReferenceBuilder};
    use std::io::Cursor;

    fn catalog_of(bytes: Vec<u8>) -> BaiResult<Catalog> {
        let mut cursor = ByteCursor::new(Cursor::new(bytes))?;
        build_catalog(&mut cursor)
    }

    #[test]
    fn test_minimal_index() {
        let bytes = IndexBuilder::new().reference(ReferenceBuilder::new()).build();
        let catalog = catalog_of(bytes).unwrap();

        assert_eq!(catalog.entries.len(), 1);
        assert_eq!(
            catalog.entries[0],
            CatalogEntry {
                start_offset: 8,
                end_offset: 16,
                n_bins: 0
            }
        );
        assert_eq!(catalog.n_no_coor, None);
        assert_eq!(catalog.end_offset, 16);
    }

    #[test]
    fn test_spans_and_trailer() {
        let bytes = IndexBuilder::new()
            .reference(
                ReferenceBuilder::new()
                    .bin(4681, &[(1, 2), (3, 4)])
                    .intervals(&[1]),
            )
            .reference(ReferenceBuilder::new().unmapped(0, 0, 5, 6))
            .n_no_coor(42)
            .build();
        let total = bytes.len() as u64;
        let catalog = catalog_of(bytes).unwrap();

        // n_bin + (bin, n_chunk) + 2 chunks + n_intv + 1 interval
        let first_len = 4 + 8 + 2 * 16 + 4 + 8;
        assert_eq!(catalog.entries[0].start_offset, 8);
        assert_eq!(catalog.entries[0].end_offset, 8 + first_len);
        assert_eq!(catalog.entries[1].start_offset, 8 + first_len);
        assert_eq!(catalog.entries[1].n_bins, 1);
        assert_eq!(catalog.n_no_coor, Some(42));
        assert_eq!(catalog.end_offset, total);
        assert_eq!(catalog.unmapped.get(1).map(|s| s.n_mapped), Some(5));
        assert!(catalog.unmapped.get(0).is_none());
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = IndexBuilder::new().build();
        bytes[3] = 2;
        assert!(matches!(catalog_of(bytes), Err(BaiError::Format(_))));
    }

    #[test]
    fn test_bad_unmapped_bin() {
        let bytes = IndexBuilder::new()
            .reference(ReferenceBuilder::new().raw_bin(UNMAPPED_BIN, 1, &[7, 8]))
            .build();
        assert!(matches!(catalog_of(bytes), Err(BaiError::Format(_))));
    }

    #[test]
    fn test_truncated_chunks() {
        let mut bytes = IndexBuilder::new()
            .reference(ReferenceBuilder::new().bin(4681, &[(1, 2)]).intervals(&[1]))
            .build();
        bytes.truncate(bytes.len() - 12);
        assert!(matches!(catalog_of(bytes), Err(BaiError::Format(_))));
    }

    #[test]
    fn test_partial_trailer() {
        let mut bytes = IndexBuilder::new().reference(ReferenceBuilder::new()).build();
        bytes.extend_from_slice(&[1, 2, 3]);
        assert!(matches!(catalog_of(bytes), Err(BaiError::Format(_))));
    }
}
