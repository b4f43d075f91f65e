//! Shared types for the viewer service and its UI boundary

use std::fmt;

use serde::{Deserialize, Serialize};

/// Key of an open file tab in the UI
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabKey(String);

impl TabKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabKey {
    fn from(key: &str) -> Self {
        TabKey(key.to_string())
    }
}

impl From<String> for TabKey {
    fn from(key: String) -> Self {
        TabKey(key)
    }
}

/// Identifies which session a worker result belongs to. Reopening a tab under
/// the same key gets a new `session_id`, so results for the old file are
/// recognised as stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionTag {
    pub tab: TabKey,
    pub session_id: u64,
}

/// Notifications for the UI layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ViewerEvent {
    /// Rows covering `offset..offset + CHUNK_SIZE` can be re-rendered
    #[serde(rename_all = "camelCase")]
    ChunkArrived { tab: TabKey, offset: u64 },
    /// Non-fatal read failure; a later access retries
    #[serde(rename_all = "camelCase")]
    ChunkError {
        tab: TabKey,
        offset: u64,
        message: String,
    },
}

impl ViewerEvent {
    pub fn tab(&self) -> &TabKey {
        match self {
            ViewerEvent::ChunkArrived { tab, .. } | ViewerEvent::ChunkError { tab, .. } => tab,
        }
    }

    pub fn offset(&self) -> u64 {
        match self {
            ViewerEvent::ChunkArrived { offset, .. } | ViewerEvent::ChunkError { offset, .. } => *offset,
        }
    }
}

/// Snapshot of one session's cache and queue, for the status bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub file_size: u64,
    pub cached_chunks: usize,
    pub cached_bytes: u64,
    pub max_cache_bytes: u64,
    pub requested: usize,
    pub pending: usize,
    pub active: usize,
}
