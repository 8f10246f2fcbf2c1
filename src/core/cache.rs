//! Bounded least-recently-used cache of parsed reference blocks

use crate::core::error::BaiResult;
use crate::core::records::ReferenceBlock;
use log::debug;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Number of reference blocks kept in memory by default
pub const DEFAULT_CACHE_CAPACITY: usize = 4;

/// Reference id -> parsed block, evicting the least recently used entry
/// once capacity is exceeded. Evicted blocks are simply dropped.
pub struct ReferenceCache {
    blocks: LruCache<usize, ReferenceBlock>,
    loads: u64,
}

impl ReferenceCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            blocks: LruCache::new(capacity),
            loads: 0,
        }
    }

    /// Return the cached block for `ref_id`, running `load` on a miss.
    ///
    /// A hit marks the entry most recently used and performs no I/O. A failed
    /// load leaves the cache unchanged.
    pub fn get_or_load<F>(&mut self, ref_id: usize, load: F) -> BaiResult<&ReferenceBlock>
    where
        F: FnOnce() -> BaiResult<ReferenceBlock>,
    {
        if !self.blocks.contains(&ref_id) {
            if self.blocks.len() == self.blocks.cap().get() {
                if let Some((evicted, _)) = self.blocks.peek_lru() {
                    debug!("Evicting reference {} from block cache", evicted);
                }
            }
            debug!("Loading reference {} into block cache", ref_id);
            self.loads += 1;
        }
        self.blocks.try_get_or_insert(ref_id, load)
    }

    /// Whether `ref_id` is cached; does not affect recency
    pub fn contains(&self, ref_id: usize) -> bool {
        self.blocks.contains(&ref_id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.blocks.cap().get()
    }

    /// Number of misses that invoked the loader so far
    pub fn loads(&self) -> u64 {
        self.loads
    }
}

impl Default for ReferenceCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::BaiError;

    fn block(tag: u64) -> ReferenceBlock {
        ReferenceBlock {
            intervals: vec![tag],
            ..Default::default()
        }
    }

    #[test]
    fn test_hit_skips_loader() {
        let mut cache = ReferenceCache::default();
        cache.get_or_load(0, || Ok(block(1))).unwrap();
        let hit = cache
            .get_or_load(0, || panic!("loader must not run on a hit"))
            .unwrap();
        assert_eq!(hit.intervals, vec![1]);
        assert_eq!(cache.loads(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = ReferenceCache::new(NonZeroUsize::new(2).unwrap());
        cache.get_or_load(0, || Ok(block(0))).unwrap();
        cache.get_or_load(1, || Ok(block(1))).unwrap();
        // Touch 0 so that 1 becomes least recently used
        cache.get_or_load(0, || Ok(block(0))).unwrap();
        cache.get_or_load(2, || Ok(block(2))).unwrap();

        assert!(cache.contains(0));
        assert!(!cache.contains(1));
        assert!(cache.contains(2));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.loads(), 3);
    }

    #[test]
    fn test_failed_load_not_cached() {
        let mut cache = ReferenceCache::default();
        let result = cache.get_or_load(3, || Err(BaiError::Format("bad".into())));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
