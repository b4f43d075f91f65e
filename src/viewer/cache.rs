//! Chunk cache for the hex viewer
//!
//! Holds whole chunks keyed by their chunk-aligned offset plus the set of
//! offsets that have been requested but not yet delivered. When the total
//! cached size goes over budget the oldest-inserted half of the entries is
//! dropped (insertion order, not recency).

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{chunk_offset_of, CHUNK_SIZE, MAX_CACHE_BYTES};
use crate::error::{ViewerError, ViewerResult};

/// Size limits for one cache instance, loadable from an embedder's JSON
/// settings; missing fields fall back to the defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheLimits {
    pub max_cache_bytes: u64,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            max_cache_bytes: MAX_CACHE_BYTES,
        }
    }
}

/// Immutable slice of the source anchored at a chunk-aligned offset
#[derive(Debug)]
pub struct Chunk {
    data: Box<[u8]>,
}

impl Chunk {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: data.into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

pub struct ChunkCache {
    chunks: HashMap<u64, Chunk>,
    /// Offsets in insertion order, oldest first
    order: VecDeque<u64>,
    /// Offsets with a read outstanding
    requested: HashSet<u64>,
    total_bytes: u64,
    limits: CacheLimits,
}

impl ChunkCache {
    pub fn new() -> Self {
        Self::with_limits(CacheLimits::default())
    }

    pub fn with_limits(limits: CacheLimits) -> Self {
        Self {
            chunks: HashMap::new(),
            order: VecDeque::new(),
            requested: HashSet::new(),
            total_bytes: 0,
            limits,
        }
    }

    /// Byte at absolute `index`, or `None` if its chunk is not cached or the
    /// chunk ends before `index`. Never fetches.
    pub fn get_byte(&self, index: u64) -> Option<u8> {
        let offset = chunk_offset_of(index);
        let chunk = self.chunks.get(&offset)?;
        chunk.bytes().get((index - offset) as usize).copied()
    }

    pub fn get(&self, offset: u64) -> Option<&Chunk> {
        self.chunks.get(&offset)
    }

    pub fn contains(&self, offset: u64) -> bool {
        self.chunks.contains_key(&offset)
    }

    /// Take ownership of `chunk` at `offset` and enforce the budget.
    /// Returns the offsets evicted by this insertion.
    pub fn insert(&mut self, offset: u64, chunk: Chunk) -> ViewerResult<Vec<u64>> {
        if offset % CHUNK_SIZE != 0 {
            return Err(ViewerError::MisalignedOffset(offset));
        }
        if chunk.len() as u64 > CHUNK_SIZE {
            return Err(ViewerError::InvalidLength {
                offset,
                length: chunk.len() as u64,
            });
        }

        self.requested.remove(&offset);

        if let Some(previous) = self.chunks.remove(&offset) {
            self.total_bytes -= previous.len() as u64;
            self.order.retain(|&o| o != offset);
        }

        self.total_bytes += chunk.len() as u64;
        self.chunks.insert(offset, chunk);
        self.order.push_back(offset);
        trace!(offset, total_bytes = self.total_bytes, "Chunk cached");

        Ok(self.evict_if_over_budget())
    }

    /// Drop the oldest-inserted `floor(n/2)` chunks if over budget
    pub fn evict_if_over_budget(&mut self) -> Vec<u64> {
        if self.total_bytes <= self.limits.max_cache_bytes {
            return Vec::new();
        }

        let evict_count = self.order.len() / 2;
        let evicted: Vec<u64> = self.order.drain(..evict_count).collect();

        for offset in &evicted {
            if let Some(chunk) = self.chunks.remove(offset) {
                self.total_bytes -= chunk.len() as u64;
            }
            self.requested.remove(offset);
        }

        debug!(
            evicted = evicted.len(),
            remaining = self.order.len(),
            total_bytes = self.total_bytes,
            "Cache over budget, evicted oldest chunks"
        );
        evicted
    }

    // -------------------------------------------------------------------------
    // Requested-offsets set
    // -------------------------------------------------------------------------

    pub fn is_requested(&self, offset: u64) -> bool {
        self.requested.contains(&offset)
    }

    /// Returns false if the offset was already marked
    pub fn mark_requested(&mut self, offset: u64) -> bool {
        self.requested.insert(offset)
    }

    pub fn clear_requested(&mut self, offset: u64) {
        self.requested.remove(&offset);
    }

    pub fn requested_count(&self) -> usize {
        self.requested.len()
    }

    // -------------------------------------------------------------------------
    // Stats / teardown
    // -------------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn limits(&self) -> CacheLimits {
        self.limits
    }

    /// Offsets currently cached, oldest insertion first
    pub fn offsets(&self) -> impl Iterator<Item = u64> + '_ {
        self.order.iter().copied()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.order.clear();
        self.requested.clear();
        self.total_bytes = 0;
    }
}

impl Default for ChunkCache {
    fn default() -> Self {
        Self::new()
    }
}
