//! Hex viewer backend: chunk cache and background chunk reading
//!
//! The UI asks for single bytes while it paints the hex grid. Answers come
//! from a per-tab cache of 256 KiB chunks; a miss returns `None` at once and
//! queues a read that runs on the tab's own worker pool. When the chunk lands the
//! service emits [`ViewerEvent::ChunkArrived`] and the UI repaints.
//!
//! ## Architecture
//!
//! ```text
//! request_byte(tab, i)
//!   └─ ViewerSession ─ ByteAccessor ─┬─ ChunkCache (offset → chunk, requested set)
//!                                    └─ ChunkQueue (priority, max 4 active)
//!                                           │ dispatch
//!                                           ▼
//!                                    ChunkWorkers (rayon pool per session)
//!                                           │ WorkerMessage { tag, offset, bytes }
//!                                           ▼
//! poll_events() ── insert + evict ── ViewerEvent::{ChunkArrived, ChunkError}
//! ```
//!
//! Everything except the reads is owned by [`HexViewerService`] and mutated
//! through `&mut self`; workers only see the read-only source.

pub mod accessor;
pub mod cache;
pub mod queue;
pub mod service;
pub mod session;
pub mod source;
pub mod types;
pub mod worker;

pub use accessor::{viewport_priority, ByteAccessor, MissDebouncer};
pub use cache::{CacheLimits, Chunk, ChunkCache};
pub use queue::{ChunkQueue, ChunkRequest};
pub use service::HexViewerService;
pub use session::ViewerSession;
pub use source::{ChunkSource, FileSource, MemorySource, SharedSource};
pub use types::{CacheStats, SessionTag, TabKey, ViewerEvent};
pub use worker::{ChunkWorkers, WorkerMessage};

pub use crate::search::MAX_SEARCH_MATCHES;

/// Nominal chunk size (256 KiB)
pub const CHUNK_SIZE: u64 = 262_144;

/// Cache budget per session (50 MiB)
pub const MAX_CACHE_BYTES: u64 = 52_428_800;

/// Reads in flight per session
pub const MAX_CONCURRENT_WORKERS: usize = 4;

/// Minimum interval between miss-triggered requests for one chunk
pub const DEBOUNCE_MS: u64 = 50;

/// Chunk-aligned offset of the chunk holding `index`
#[inline]
pub fn chunk_offset_of(index: u64) -> u64 {
    (index / CHUNK_SIZE) * CHUNK_SIZE
}
