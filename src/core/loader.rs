//! Full parse of a single reference block
//!
//! Seeks to the catalog-recorded offset of a reference and decodes its bins,
//! chunks and linear index. May run in any order and any number of times.

use crate::core::binning::UNMAPPED_BIN;
use crate::core::catalog::UnmappedStatsStore;
use crate::core::error::{BaiError, BaiResult};
use crate::core::io::ByteCursor;
use crate::core::records::{CatalogEntry, Chunk, ReferenceBlock, UnmappedStats};
use log::trace;
use std::collections::HashMap;
use std::io::{Read, Seek};

/// Size of one encoded chunk (two virtual offsets)
pub(crate) const CHUNK_SIZE: u64 = 16;

/// Size of one encoded linear interval
pub(crate) const INTERVAL_SIZE: u64 = 8;

/// Decode a non-negative `int32` count
pub(crate) fn read_count<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    what: &str,
) -> BaiResult<usize> {
    let n = cursor.read_i32(what)?;
    usize::try_from(n).map_err(|_| BaiError::Format(format!("negative {}: {}", what, n)))
}

/// Decode the payload of the unmapped pseudo-bin.
///
/// The pseudo-bin always declares exactly two chunks, which hold four
/// counters rather than virtual offsets.
pub(crate) fn read_unmapped<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    n_chunks: i32,
) -> BaiResult<UnmappedStats> {
    if n_chunks != 2 {
        return Err(BaiError::Format(format!(
            "bin {} is supposed to have 2 chunks, this has {}",
            UNMAPPED_BIN, n_chunks
        )));
    }
    Ok(UnmappedStats {
        unmapped_begin: cursor.read_u64("unmapped stats")?,
        unmapped_end: cursor.read_u64("unmapped stats")?,
        n_mapped: cursor.read_u64("unmapped stats")?,
        n_unmapped: cursor.read_u64("unmapped stats")?,
    })
}

/// Parse the block of `ref_id` described by `entry`.
///
/// Unmapped statistics found along the way go to `unmapped`, never into the
/// returned bins map. Landing anywhere other than the catalog's start or end
/// offset fails with `IntegrityError`.
pub fn load_reference<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    ref_id: usize,
    entry: &CatalogEntry,
    unmapped: &mut UnmappedStatsStore,
) -> BaiResult<ReferenceBlock> {
    cursor.seek_to(entry.start_offset)?;
    let found = cursor.tell()?;
    if found != entry.start_offset {
        return Err(BaiError::Integrity {
            ref_id,
            expected: entry.start_offset,
            found,
        });
    }

    let n_bins = read_count(cursor, "n_bin")?;
    let mut bins = HashMap::with_capacity(n_bins);

    for _ in 0..n_bins {
        let bin_id = cursor.read_i32("bin id")? as u32;
        let n_chunks = cursor.read_i32("n_chunk")?;

        if bin_id == UNMAPPED_BIN {
            unmapped.insert(ref_id, read_unmapped(cursor, n_chunks)?);
            continue;
        }

        let n_chunks = usize::try_from(n_chunks)
            .map_err(|_| BaiError::Format(format!("negative n_chunk: {}", n_chunks)))?;
        let raw = cursor.read_u64_array(n_chunks * 2, "chunks")?;
        let chunks: Vec<Chunk> = raw
            .chunks_exact(2)
            .map(|pair| Chunk::new(pair[0], pair[1]))
            .collect();
        bins.insert(bin_id, chunks);
    }

    let n_intervals = read_count(cursor, "n_intv")?;
    let intervals = cursor.read_u64_array(n_intervals, "linear index")?;

    let found = cursor.tell()?;
    if found != entry.end_offset {
        return Err(BaiError::Integrity {
            ref_id,
            expected: entry.end_offset,
            found,
        });
    }

    trace!(
        "Loaded reference {}: {} bins, {} intervals",
        ref_id,
        bins.len(),
        intervals.len()
    );

    Ok(ReferenceBlock { bins, intervals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::synth::{IndexBuilder, ReferenceBuilder};
    use std::io::Cursor;

    fn sample() -> Vec<u8> {
        IndexBuilder::new()
            .reference(
                ReferenceBuilder::new()
                    .bin(4681, &[(100, 200), (300, 400)])
                    .bin(4682, &[(500, 600)])
                    .unmapped(10, 20, 30, 40)
                    .intervals(&[100, 500]),
            )
            .build()
    }

    #[test]
    fn test_load_full_block() {
        let bytes = sample();
        let entry = CatalogEntry {
            start_offset: 8,
            end_offset: bytes.len() as u64,
            n_bins: 3,
        };
        let mut cursor = ByteCursor::new(Cursor::new(bytes)).unwrap();
        let mut unmapped = UnmappedStatsStore::default();

        let block = load_reference(&mut cursor, 0, &entry, &mut unmapped).unwrap();

        assert_eq!(block.bins.len(), 2);
        assert!(!block.bins.contains_key(&UNMAPPED_BIN));
        assert_eq!(
            block.bins[&4681],
            vec![Chunk::new(100, 200), Chunk::new(300, 400)]
        );
        assert_eq!(block.intervals, vec![100, 500]);
        assert_eq!(unmapped.get(0).map(|s| s.n_unmapped), Some(40));
    }

    #[test]
    fn test_end_offset_mismatch() {
        let bytes = sample();
        let entry = CatalogEntry {
            start_offset: 8,
            end_offset: bytes.len() as u64 - 8,
            n_bins: 3,
        };
        let mut cursor = ByteCursor::new(Cursor::new(bytes)).unwrap();
        let mut unmapped = UnmappedStatsStore::default();

        let err = load_reference(&mut cursor, 0, &entry, &mut unmapped).unwrap_err();
        assert!(matches!(err, BaiError::Integrity { ref_id: 0, .. }));
    }

    #[test]
    fn test_bad_unmapped_chunk_count() {
        let bytes = IndexBuilder::new()
            .reference(ReferenceBuilder::new().raw_bin(UNMAPPED_BIN, 3, &[1, 2, 3, 4, 5, 6]))
            .build();
        let mut cursor = ByteCursor::new(Cursor::new(bytes)).unwrap();
        cursor.seek_to(8).unwrap();
        cursor.read_i32("n_bin").unwrap();
        cursor.read_i32("bin id").unwrap();
        let n_chunks = cursor.read_i32("n_chunk").unwrap();

        assert!(matches!(
            read_unmapped(&mut cursor, n_chunks),
            Err(BaiError::Format(_))
        ));
    }
}
