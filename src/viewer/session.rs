//! One open file tab: its accessor, cache, queue and reader pool

use std::sync::mpsc::Sender;
use std::time::Instant;

use tracing::{debug, warn};

use super::accessor::ByteAccessor;
use super::cache::{CacheLimits, Chunk};
use super::source::SharedSource;
use super::types::{CacheStats, SessionTag, ViewerEvent};
use super::worker::{ChunkWorkers, WorkerMessage};
use super::{chunk_offset_of, CHUNK_SIZE, MAX_CONCURRENT_WORKERS};
use crate::error::{ViewerError, ViewerResult};

pub struct ViewerSession {
    tag: SessionTag,
    accessor: ByteAccessor,
    workers: ChunkWorkers,
}

impl ViewerSession {
    pub fn new(tag: SessionTag, source: SharedSource, tx: Sender<WorkerMessage>) -> ViewerResult<Self> {
        Self::with_limits(tag, source, CacheLimits::default(), tx)
    }

    pub fn with_limits(
        tag: SessionTag,
        source: SharedSource,
        limits: CacheLimits,
        tx: Sender<WorkerMessage>,
    ) -> ViewerResult<Self> {
        Ok(Self {
            tag,
            accessor: ByteAccessor::with_limits(source, limits),
            workers: ChunkWorkers::new(MAX_CONCURRENT_WORKERS, tx)?,
        })
    }

    pub fn tag(&self) -> &SessionTag {
        &self.tag
    }

    pub fn file_size(&self) -> u64 {
        self.accessor.source().len()
    }

    /// Largest chunk span a single range request may cover. Half the cache
    /// budget, so the newest half that survives an eviction always holds the
    /// whole range.
    pub fn max_range_bytes(&self) -> u64 {
        (self.accessor.cache().limits().max_cache_bytes / 2).max(CHUNK_SIZE)
    }

    /// Byte lookup; misses are queued and the queue is pumped
    pub fn request_byte(&mut self, index: u64, now: Instant) -> Option<u8> {
        let byte = self.accessor.get_byte_at(index, now);
        if byte.is_none() {
            self.pump();
        }
        byte
    }

    /// Look up `len` bytes from `start`, clamped to the file size. Ranges whose
    /// chunks would not fit in the cache together are rejected; walk those with
    /// [`ViewerSession::for_each_window`] instead.
    pub fn request_range(&mut self, start: u64, len: u64, now: Instant) -> ViewerResult<Vec<Option<u8>>> {
        let end = start.saturating_add(len).min(self.file_size());
        if end <= start {
            return Ok(Vec::new());
        }

        let span = chunk_offset_of(end - 1) + CHUNK_SIZE - chunk_offset_of(start);
        let max = self.max_range_bytes();
        if span > max {
            return Err(ViewerError::RangeTooLarge {
                start,
                length: len,
                max,
            });
        }

        let bytes: Vec<Option<u8>> = (start..end)
            .map(|index| self.accessor.get_byte_at(index, now))
            .collect();
        if bytes.iter().any(Option::is_none) {
            self.pump();
        }
        Ok(bytes)
    }

    pub fn set_viewport(&mut self, first_visible_index: u64) {
        self.accessor.set_viewport(first_visible_index);
    }

    /// Dispatch queued requests while under the concurrency ceiling
    pub fn pump(&mut self) -> usize {
        let tag = &self.tag;
        let workers = &self.workers;
        self.accessor
            .queue_mut()
            .dispatch_loop(|request| workers.spawn_read(tag.clone(), request))
    }

    /// Apply a worker result that belongs to this session
    pub fn complete(&mut self, offset: u64, result: Result<Vec<u8>, String>) -> ViewerEvent {
        self.accessor.queue_mut().complete();
        let tab = self.tag.tab.clone();

        let failure = match result {
            Ok(buffer) => match self.accessor.cache_mut().insert(offset, Chunk::new(buffer)) {
                Ok(evicted) => {
                    if !evicted.is_empty() {
                        debug!(%tab, evicted = evicted.len(), "Evicted chunks after insert");
                    }
                    return ViewerEvent::ChunkArrived { tab, offset };
                }
                Err(e) => e.to_string(),
            },
            Err(message) => message,
        };

        warn!(%tab, offset, error = %failure, "Chunk unavailable");
        self.accessor.cache_mut().clear_requested(offset);
        ViewerEvent::ChunkError {
            tab,
            offset,
            message: failure,
        }
    }

    /// Walk `[start, start + len)` in chunk-sized windows, preferring cached
    /// chunks and reading the rest straight from the source without caching.
    /// `visit` returns false to stop early.
    pub fn for_each_window<F>(&self, start: u64, len: u64, mut visit: F) -> ViewerResult<()>
    where
        F: FnMut(u64, &[u8]) -> bool,
    {
        let end = start.saturating_add(len).min(self.file_size());
        let mut pos = start;

        while pos < end {
            let chunk_offset = chunk_offset_of(pos);
            let skip = (pos - chunk_offset) as usize;
            let take = (end - pos).min(CHUNK_SIZE - skip as u64) as usize;

            let keep_going = match self.accessor.cache().get(chunk_offset) {
                Some(chunk) if chunk.len() >= skip + take => visit(pos, &chunk.bytes()[skip..skip + take]),
                _ => {
                    let bytes = self.accessor.source().read_at(pos, take as u64)?;
                    if bytes.is_empty() {
                        break;
                    }
                    let read = bytes.len() as u64;
                    let keep_going = visit(pos, &bytes);
                    if read < take as u64 {
                        break;
                    }
                    keep_going
                }
            };

            if !keep_going {
                break;
            }
            pos += take as u64;
        }

        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.accessor.cache();
        let queue = self.accessor.queue();
        CacheStats {
            file_size: self.file_size(),
            cached_chunks: cache.len(),
            cached_bytes: cache.total_bytes(),
            max_cache_bytes: cache.limits().max_cache_bytes,
            requested: cache.requested_count(),
            pending: queue.pending(),
            active: queue.active(),
        }
    }

    pub fn accessor(&self) -> &ByteAccessor {
        &self.accessor
    }

    /// Drop cached chunks and queued reads and retire the reader pool.
    /// In-flight reads are not awaited.
    pub fn clear(&mut self) {
        self.workers.retire();
        self.accessor.clear();
    }
}
