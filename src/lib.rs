//! FFX Hex Viewer core
//!
//! Backend for the forensic explorer's hex viewer: a per-tab cache of file
//! chunks, a bounded pool of background readers, byte/ASCII search and
//! selection hashing. The UI talks to [`viewer::HexViewerService`] and
//! repaints when it reports [`viewer::ViewerEvent::ChunkArrived`].

pub mod common;
pub mod error;
pub mod logging;
pub mod search;
pub mod viewer;

pub use error::{ViewerError, ViewerResult};
pub use search::{find_pattern_indices, SearchKind, SearchOptions, SearchResult};
pub use viewer::{
    CacheStats, ChunkSource, FileSource, HexViewerService, MemorySource, SessionTag, TabKey,
    ViewerEvent, CHUNK_SIZE, DEBOUNCE_MS, MAX_CACHE_BYTES, MAX_CONCURRENT_WORKERS,
    MAX_SEARCH_MATCHES,
};
