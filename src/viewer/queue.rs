//! Pending chunk reads and the concurrency ceiling for one session

use std::fmt;

use tracing::{debug, trace};

use super::source::SharedSource;
use super::{CHUNK_SIZE, MAX_CONCURRENT_WORKERS};
use crate::error::{ViewerError, ViewerResult};

/// One read of `[offset, offset + length)` from a source.
/// Lower `priority` values are dispatched first.
#[derive(Clone)]
pub struct ChunkRequest {
    pub source: SharedSource,
    pub offset: u64,
    pub length: u64,
    pub priority: u64,
}

impl ChunkRequest {
    /// Validate and build a request; the offset must be chunk-aligned and the
    /// range must be non-empty and representable
    pub fn new(source: SharedSource, offset: u64, length: u64, priority: u64) -> ViewerResult<Self> {
        if offset % CHUNK_SIZE != 0 {
            return Err(ViewerError::MisalignedOffset(offset));
        }
        if length == 0 || offset.checked_add(length).is_none() {
            return Err(ViewerError::InvalidLength { offset, length });
        }

        Ok(Self {
            source,
            offset,
            length,
            priority,
        })
    }
}

impl fmt::Debug for ChunkRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkRequest")
            .field("source", &self.source.describe())
            .field("offset", &self.offset)
            .field("length", &self.length)
            .field("priority", &self.priority)
            .finish()
    }
}

pub struct ChunkQueue {
    pending: Vec<ChunkRequest>,
    active: usize,
    max_concurrent: usize,
}

impl ChunkQueue {
    pub fn new() -> Self {
        Self::with_max_concurrent(MAX_CONCURRENT_WORKERS)
    }

    pub fn with_max_concurrent(max_concurrent: usize) -> Self {
        Self {
            pending: Vec::new(),
            active: 0,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Queue a request; nothing is dispatched until [`Self::dispatch_loop`]
    pub fn enqueue(&mut self, request: ChunkRequest) {
        trace!(offset = request.offset, priority = request.priority, "Chunk request queued");
        self.pending.push(request);
    }

    /// Hand requests to `dispatch` in priority order until the ceiling is
    /// reached. Equal priorities leave no ordering guarantee.
    /// Returns how many requests were dispatched.
    pub fn dispatch_loop<F>(&mut self, mut dispatch: F) -> usize
    where
        F: FnMut(ChunkRequest),
    {
        if self.pending.is_empty() || self.active >= self.max_concurrent {
            return 0;
        }

        self.pending.sort_unstable_by_key(|r| r.priority);

        let slots = self.max_concurrent - self.active;
        let take = slots.min(self.pending.len());
        for request in self.pending.drain(..take) {
            self.active += 1;
            dispatch(request);
        }

        debug!(dispatched = take, active = self.active, pending = self.pending.len(), "Chunk requests dispatched");
        take
    }

    /// A dispatched request resolved (success or failure)
    pub fn complete(&mut self) {
        self.active = self.active.saturating_sub(1);
    }

    /// Drop every pending request; in-flight reads are left to finish
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn is_pending(&self, offset: u64) -> bool {
        self.pending.iter().any(|r| r.offset == offset)
    }
}

impl Default for ChunkQueue {
    fn default() -> Self {
        Self::new()
    }
}
