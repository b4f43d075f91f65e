//! Background chunk readers
//!
//! Each session owns a small rayon pool and reports back over a channel shared
//! with the service. The buffer is moved into the message, so the owning
//! context receives it without a copy. A read that errors or panics only fails
//! its own request, and a stalled read only ties up its own session's pool.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::queue::ChunkRequest;
use super::types::SessionTag;
use crate::error::ViewerResult;

/// Result of one dispatched read, posted back to the owning context
#[derive(Debug)]
pub struct WorkerMessage {
    pub tag: SessionTag,
    pub offset: u64,
    pub result: Result<Vec<u8>, String>,
}

pub struct ChunkWorkers {
    pool: rayon::ThreadPool,
    tx: Sender<WorkerMessage>,
    /// Set once the session is closed; reads not yet started are skipped
    retired: Arc<AtomicBool>,
}

impl ChunkWorkers {
    /// Build a pool of `threads` readers posting into `tx`
    pub fn new(threads: usize, tx: Sender<WorkerMessage>) -> ViewerResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("chunk-reader-{}", i))
            .build()?;
        debug!(threads, "Chunk reader pool started");
        Ok(Self {
            pool,
            tx,
            retired: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Read the request's range on the pool and post the outcome
    pub fn spawn_read(&self, tag: SessionTag, request: ChunkRequest) {
        let tx = self.tx.clone();
        let retired = Arc::clone(&self.retired);
        self.pool.spawn(move || {
            let ChunkRequest {
                source,
                offset,
                length,
                ..
            } = request;

            if retired.load(Ordering::Acquire) {
                trace!(tab = %tag.tab, offset, "Skipping read for retired session");
                return;
            }

            let result = match catch_unwind(AssertUnwindSafe(|| source.read_at(offset, length))) {
                Ok(Ok(buffer)) => Ok(buffer),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!("Chunk reader panicked at offset {}", offset)),
            };
            if let Err(ref message) = result {
                warn!(tab = %tag.tab, offset, error = %message, "Chunk read failed");
            }

            // Receiver gone means the service shut down; nothing to report to
            let _ = tx.send(WorkerMessage { tag, offset, result });
        });
    }

    /// Stop starting new reads. Reads already running finish on their own.
    pub fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }
}
