//! Read-only byte sources the chunk readers slice from

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::error::{ViewerError, ViewerResult};

/// A read-only random access source shared by all readers of one session
pub trait ChunkSource: Send + Sync {
    /// Total size in bytes
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read `[offset, offset + length)` clamped to the source size.
    /// Reading at or past the end yields an empty buffer.
    fn read_at(&self, offset: u64, length: u64) -> ViewerResult<Vec<u8>>;

    /// Short label for log output
    fn describe(&self) -> String;
}

/// Shared handle type passed into sessions and requests
pub type SharedSource = Arc<dyn ChunkSource>;

// =============================================================================
// File-backed source
// =============================================================================

/// Local evidence file, reopened for every read so concurrent readers never
/// share a cursor
pub struct FileSource {
    path: PathBuf,
    size: u64,
    detached: AtomicBool,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> ViewerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let size = std::fs::metadata(&path)?.len();
        Ok(Self {
            path,
            size,
            detached: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Revoke the handle; every later read fails with [`ViewerError::Detached`]
    pub fn detach(&self) {
        self.detached.store(true, Ordering::Release);
    }
}

impl ChunkSource for FileSource {
    fn len(&self) -> u64 {
        self.size
    }

    fn read_at(&self, offset: u64, length: u64) -> ViewerResult<Vec<u8>> {
        if self.detached.load(Ordering::Acquire) {
            return Err(ViewerError::Detached);
        }

        let start = offset.min(self.size);
        let to_read = length.min(self.size - start);

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(start))?;

        let mut buffer = Vec::with_capacity(to_read as usize);
        file.take(to_read).read_to_end(&mut buffer)?;
        trace!(offset = start, requested = length, read = buffer.len(), "File slice read");

        Ok(buffer)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// =============================================================================
// In-memory source
// =============================================================================

/// Bytes already held in memory (dropped files, carved buffers)
pub struct MemorySource {
    name: String,
    data: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

impl ChunkSource for MemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_at(&self, offset: u64, length: u64) -> ViewerResult<Vec<u8>> {
        let size = self.data.len() as u64;
        let start = offset.min(size);
        let end = start.saturating_add(length).min(size);
        Ok(self.data[start as usize..end as usize].to_vec())
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }
}
