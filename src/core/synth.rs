//! In-memory construction of BAI bytes for tests and benchmarks
//!
//! Produces well-formed (or deliberately malformed) index images without
//! needing a real alignment file.

use crate::core::binning::UNMAPPED_BIN;
use crate::core::catalog::BAI_MAGIC;
use byteorder::{LittleEndian, WriteBytesExt};

/// One reference block to serialise
#[derive(Debug, Clone, Default)]
pub struct ReferenceBuilder {
    // (bin id, declared n_chunk, raw u64 payload)
    bins: Vec<(u32, i32, Vec<u64>)>,
    intervals: Vec<u64>,
}

impl ReferenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bin with the given `(begin, end)` chunks, in order
    pub fn bin(mut self, bin_id: u32, chunks: &[(u64, u64)]) -> Self {
        let payload = chunks.iter().flat_map(|&(b, e)| [b, e]).collect();
        self.bins.push((bin_id, chunks.len() as i32, payload));
        self
    }

    /// Add the unmapped pseudo-bin
    pub fn unmapped(mut self, begin: u64, end: u64, n_mapped: u64, n_unmapped: u64) -> Self {
        self.bins
            .push((UNMAPPED_BIN, 2, vec![begin, end, n_mapped, n_unmapped]));
        self
    }

    /// Add a bin with an arbitrary declared chunk count and payload
    pub fn raw_bin(mut self, bin_id: u32, n_chunk: i32, payload: &[u64]) -> Self {
        self.bins.push((bin_id, n_chunk, payload.to_vec()));
        self
    }

    pub fn intervals(mut self, intervals: &[u64]) -> Self {
        self.intervals = intervals.to_vec();
        self
    }

    fn write(&self, out: &mut Vec<u8>) {
        put_i32(out, self.bins.len() as i32);
        for (bin_id, n_chunk, payload) in &self.bins {
            put_i32(out, *bin_id as i32);
            put_i32(out, *n_chunk);
            payload.iter().for_each(|v| put_u64(out, *v));
        }
        put_i32(out, self.intervals.len() as i32);
        self.intervals.iter().for_each(|v| put_u64(out, *v));
    }
}

/// Whole-file builder
#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    references: Vec<ReferenceBuilder>,
    n_no_coor: Option<u64>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reference(mut self, reference: ReferenceBuilder) -> Self {
        self.references.push(reference);
        self
    }

    /// Append the optional trailer
    pub fn n_no_coor(mut self, n: u64) -> Self {
        self.n_no_coor = Some(n);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = BAI_MAGIC.to_vec();
        put_i32(&mut out, self.references.len() as i32);
        for reference in &self.references {
            reference.write(&mut out);
        }
        if let Some(n) = self.n_no_coor {
            put_u64(&mut out, n);
        }
        out
    }
}

// Writing into a Vec cannot fail.
fn put_i32(out: &mut Vec<u8>, v: i32) {
    let _ = out.write_i32::<LittleEndian>(v);
}

fn put_u64(out: &mut Vec<u8>, v: u64) {
    let _ = out.write_u64::<LittleEndian>(v);
}
