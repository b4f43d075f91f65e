//! Synchronous byte lookup for the hex grid
//!
//! `get_byte` answers from the cache or returns `None` straight away. A miss
//! queues a read for the enclosing chunk unless one is already outstanding or
//! the same chunk was asked for within the debounce window.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::trace;

use super::cache::{CacheLimits, ChunkCache};
use super::queue::{ChunkQueue, ChunkRequest};
use super::source::SharedSource;
use super::{chunk_offset_of, CHUNK_SIZE, DEBOUNCE_MS};

/// Entries older than the window are pruned once the map grows past this
const DEBOUNCE_PRUNE_THRESHOLD: usize = 1024;

/// Minimum-interval gate for miss-triggered requests, keyed by chunk offset
pub struct MissDebouncer {
    window: Duration,
    last_request: HashMap<u64, Instant>,
}

impl MissDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_request: HashMap::new(),
        }
    }

    /// Record a request at `now` unless one was recorded inside the window
    pub fn allow(&mut self, offset: u64, now: Instant) -> bool {
        if let Some(&last) = self.last_request.get(&offset) {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }

        if self.last_request.len() >= DEBOUNCE_PRUNE_THRESHOLD {
            let window = self.window;
            self.last_request
                .retain(|_, &mut at| now.saturating_duration_since(at) < window);
        }
        self.last_request.insert(offset, now);
        true
    }

    pub fn clear(&mut self) {
        self.last_request.clear();
    }
}

impl Default for MissDebouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEBOUNCE_MS))
    }
}

/// Distance in chunks between `chunk_offset` and the chunk holding the first
/// visible byte; the visible chunk gets 0
pub fn viewport_priority(chunk_offset: u64, viewport_index: u64) -> u64 {
    let viewport_chunk = viewport_index / CHUNK_SIZE;
    let chunk = chunk_offset / CHUNK_SIZE;
    chunk.abs_diff(viewport_chunk)
}

pub struct ByteAccessor {
    source: SharedSource,
    cache: ChunkCache,
    queue: ChunkQueue,
    debouncer: MissDebouncer,
    viewport_index: u64,
}

impl ByteAccessor {
    pub fn new(source: SharedSource) -> Self {
        Self::with_parts(source, ChunkCache::new(), ChunkQueue::new())
    }

    pub fn with_limits(source: SharedSource, limits: CacheLimits) -> Self {
        Self::with_parts(source, ChunkCache::with_limits(limits), ChunkQueue::new())
    }

    fn with_parts(source: SharedSource, cache: ChunkCache, queue: ChunkQueue) -> Self {
        Self {
            source,
            cache,
            queue,
            debouncer: MissDebouncer::default(),
            viewport_index: 0,
        }
    }

    pub fn get_byte(&mut self, index: u64) -> Option<u8> {
        self.get_byte_at(index, Instant::now())
    }

    /// Cache lookup; on a miss inside the file, queue the chunk (not dispatched)
    pub fn get_byte_at(&mut self, index: u64, now: Instant) -> Option<u8> {
        if let Some(byte) = self.cache.get_byte(index) {
            return Some(byte);
        }
        if index < self.source.len() {
            self.request_chunk(chunk_offset_of(index), now);
        }
        None
    }

    /// Queue a read for the chunk at `offset` if it is not cached, not already
    /// requested and not debounced. Returns true if a request was queued.
    pub fn request_chunk(&mut self, offset: u64, now: Instant) -> bool {
        if self.cache.contains(offset) || self.cache.is_requested(offset) {
            return false;
        }
        if !self.debouncer.allow(offset, now) {
            trace!(offset, "Chunk request debounced");
            return false;
        }

        let length = CHUNK_SIZE.min(self.source.len().saturating_sub(offset));
        let priority = viewport_priority(offset, self.viewport_index);
        match ChunkRequest::new(self.source.clone(), offset, length, priority) {
            Ok(request) => {
                self.cache.mark_requested(offset);
                self.queue.enqueue(request);
                true
            }
            Err(e) => {
                trace!(offset, error = %e, "Chunk request rejected");
                false
            }
        }
    }

    pub fn set_viewport(&mut self, first_visible_index: u64) {
        self.viewport_index = first_visible_index;
    }

    pub fn viewport(&self) -> u64 {
        self.viewport_index
    }

    pub fn source(&self) -> &SharedSource {
        &self.source
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ChunkCache {
        &mut self.cache
    }

    pub fn queue(&self) -> &ChunkQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut ChunkQueue {
        &mut self.queue
    }

    /// Forget everything: pending reads, cached chunks, request and debounce state
    pub fn clear(&mut self) {
        self.queue.clear();
        self.cache.clear();
        self.debouncer.clear();
    }
}
