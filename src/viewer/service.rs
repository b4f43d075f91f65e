//! Entry point for the UI layer
//!
//! `HexViewerService` binds sessions to tab keys, answers byte/range/search
//! requests and turns worker results into [`ViewerEvent`]s. All state lives in
//! the service and is only touched through `&mut self`; the UI thread drives it
//! and calls [`HexViewerService::poll_events`] from its event loop. Every
//! session reads on its own pool, so a tab stuck on slow media never holds up
//! another tab's reads.

use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, trace};

use super::cache::CacheLimits;
use super::session::ViewerSession;
use super::source::{FileSource, SharedSource};
use super::types::{CacheStats, SessionTag, TabKey, ViewerEvent};
use super::worker::WorkerMessage;
use crate::common::hash::{HashAlgorithm, RangeHash, RangeHasher};
use crate::common::hex::{format_hex_rows, HexRow, BYTES_PER_ROW};
use crate::error::{ViewerError, ViewerResult};
use crate::search::{self, PatternMatcher, SearchKind, SearchOptions, SearchResult};

pub struct HexViewerService {
    sessions: HashMap<TabKey, ViewerSession>,
    /// Cloned into each session's reader pool
    tx: Sender<WorkerMessage>,
    results: Receiver<WorkerMessage>,
    next_session_id: u64,
}

impl Default for HexViewerService {
    fn default() -> Self {
        Self::new()
    }
}

impl HexViewerService {
    pub fn new() -> Self {
        let (tx, results) = mpsc::channel();
        Self {
            sessions: HashMap::new(),
            tx,
            results,
            next_session_id: 1,
        }
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Bind a fresh cache and queue to `tab`, replacing any session it had
    pub fn open_file(&mut self, source: SharedSource, tab: impl Into<TabKey>) -> ViewerResult<SessionTag> {
        self.open_with_limits(source, tab, CacheLimits::default())
    }

    pub fn open_path(&mut self, path: impl AsRef<Path>, tab: impl Into<TabKey>) -> ViewerResult<SessionTag> {
        let source = FileSource::open(path)?;
        self.open_file(Arc::new(source), tab)
    }

    /// [`HexViewerService::open_file`] with a non-default cache budget
    pub fn open_with_limits(
        &mut self,
        source: SharedSource,
        tab: impl Into<TabKey>,
        limits: CacheLimits,
    ) -> ViewerResult<SessionTag> {
        let tag = SessionTag {
            tab: tab.into(),
            session_id: self.next_session_id,
        };
        self.next_session_id += 1;

        info!(tab = %tag.tab, session_id = tag.session_id, source = %source.describe(), size = source.len(), "Opening file");
        let session = ViewerSession::with_limits(tag.clone(), source, limits, self.tx.clone())?;
        if let Some(mut previous) = self.sessions.insert(tag.tab.clone(), session) {
            debug!(tab = %tag.tab, old_session = previous.tag().session_id, "Replaced open session");
            previous.clear();
        }
        Ok(tag)
    }

    /// Forget the tab's cache, queue and requested offsets. Reads already in
    /// flight are not awaited; their results are dropped on arrival.
    pub fn close_file(&mut self, tab: &TabKey) -> bool {
        match self.sessions.remove(tab) {
            Some(mut session) => {
                info!(%tab, session_id = session.tag().session_id, "Closing file");
                session.clear();
                true
            }
            None => false,
        }
    }

    pub fn is_open(&self, tab: &TabKey) -> bool {
        self.sessions.contains_key(tab)
    }

    pub fn open_tabs(&self) -> impl Iterator<Item = &TabKey> {
        self.sessions.keys()
    }

    fn session_mut(&mut self, tab: &TabKey) -> ViewerResult<&mut ViewerSession> {
        self.sessions
            .get_mut(tab)
            .ok_or_else(|| ViewerError::UnknownTab(tab.to_string()))
    }

    fn session(&self, tab: &TabKey) -> ViewerResult<&ViewerSession> {
        self.sessions
            .get(tab)
            .ok_or_else(|| ViewerError::UnknownTab(tab.to_string()))
    }

    // =========================================================================
    // Byte access
    // =========================================================================

    /// Cached byte or `None`; a miss schedules a background read
    pub fn request_byte(&mut self, tab: &TabKey, index: u64) -> ViewerResult<Option<u8>> {
        Ok(self.session_mut(tab)?.request_byte(index, Instant::now()))
    }

    /// Bytes `[start, start + len)` clamped to the file; unknown bytes are `None`.
    /// Fails with [`ViewerError::RangeTooLarge`] past half the cache budget.
    pub fn request_range(&mut self, tab: &TabKey, start: u64, len: u64) -> ViewerResult<Vec<Option<u8>>> {
        self.session_mut(tab)?.request_range(start, len, Instant::now())
    }

    /// `rows` grid rows starting at the row containing `start`
    pub fn hex_rows(&mut self, tab: &TabKey, start: u64, rows: usize) -> ViewerResult<Vec<HexRow>> {
        let row_start = start - start % BYTES_PER_ROW as u64;
        let len = rows
            .checked_mul(BYTES_PER_ROW)
            .and_then(|len| u64::try_from(len).ok())
            .ok_or(ViewerError::InvalidLength {
                offset: row_start,
                length: rows as u64,
            })?;
        let bytes = self.request_range(tab, row_start, len)?;
        Ok(format_hex_rows(row_start, &bytes))
    }

    /// Reads closer to `first_visible_index` are dispatched first
    pub fn set_viewport(&mut self, tab: &TabKey, first_visible_index: u64) -> ViewerResult<()> {
        self.session_mut(tab)?.set_viewport(first_visible_index);
        Ok(())
    }

    pub fn stats(&self, tab: &TabKey) -> ViewerResult<CacheStats> {
        Ok(self.session(tab)?.stats())
    }

    // =========================================================================
    // Search and hashing
    // =========================================================================

    /// Scan the whole file for `pattern`. Cached chunks are reused; the rest is
    /// read directly and not cached. Runs on the calling thread.
    #[instrument(skip(self, options), fields(tab = %tab))]
    pub fn request_search(
        &self,
        tab: &TabKey,
        pattern: &str,
        kind: SearchKind,
        options: &SearchOptions,
    ) -> ViewerResult<SearchResult> {
        let session = self.session(tab)?;
        let needle = search::parse_pattern(pattern, kind)?;
        let limit = options.limit();
        let mut matcher = PatternMatcher::new(&needle, search::folds_case(kind, options), limit);

        if !matcher.is_done() {
            session.for_each_window(0, session.file_size(), |base, window| {
                matcher.feed(base, window);
                !matcher.is_done()
            })?;
        }

        let truncated = matcher.is_truncated();
        let indices = matcher.finish();
        debug!(hits = indices.len(), truncated, "Search finished");

        Ok(SearchResult {
            indices,
            pattern_len: needle.len(),
            truncated,
        })
    }

    /// Digest `[start, start + len)` clamped to the file size
    pub fn hash_range(&self, tab: &TabKey, start: u64, len: u64, algorithm: &str) -> ViewerResult<RangeHash> {
        let session = self.session(tab)?;
        let algorithm: HashAlgorithm = algorithm.parse()?;
        let mut hasher = RangeHasher::new(algorithm);
        let mut hashed = 0u64;

        session.for_each_window(start, len, |_, window| {
            hasher.update(window);
            hashed += window.len() as u64;
            true
        })?;

        Ok(RangeHash {
            algorithm: algorithm.name().to_string(),
            hash: hasher.finalize(),
            start,
            length: hashed,
        })
    }

    // =========================================================================
    // Worker results
    // =========================================================================

    /// Apply every result that has arrived so far without blocking
    pub fn poll_events(&mut self) -> Vec<ViewerEvent> {
        let mut events = Vec::new();
        while let Ok(message) = self.results.try_recv() {
            events.extend(self.handle_message(message));
        }
        events
    }

    /// Block until at least one event is produced or `timeout` passes, then
    /// drain whatever else is ready
    pub fn wait_events(&mut self, timeout: Duration) -> Vec<ViewerEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.results.recv_timeout(remaining) {
                Ok(message) => {
                    if let Some(event) = self.handle_message(message) {
                        let mut events = vec![event];
                        events.extend(self.poll_events());
                        return events;
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return Vec::new(),
            }
        }
    }

    fn handle_message(&mut self, message: WorkerMessage) -> Option<ViewerEvent> {
        let WorkerMessage { tag, offset, result } = message;

        let session = match self.sessions.get_mut(&tag.tab) {
            Some(session) if session.tag().session_id == tag.session_id => session,
            _ => {
                trace!(tab = %tag.tab, session_id = tag.session_id, offset, "Discarding result for closed session");
                return None;
            }
        };

        let event = session.complete(offset, result);
        session.pump();
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::source::{ChunkSource, MemorySource};
    use crate::viewer::CHUNK_SIZE;
    use sha2::{Digest, Sha256};
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Condvar, Mutex};
    use tempfile::NamedTempFile;

    const CS: u64 = CHUNK_SIZE;
    const WAIT: Duration = Duration::from_secs(5);

    fn pattern_bytes(size: u64) -> Vec<u8> {
        (0..size).map(|i| (i * 31 % 251) as u8).collect()
    }

    /// Source whose reads block until the test hands out permits
    struct GatedSource {
        data: Vec<u8>,
        permits: Mutex<usize>,
        released: Condvar,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl GatedSource {
        fn new(data: Vec<u8>) -> Arc<Self> {
            Arc::new(Self {
                data,
                permits: Mutex::new(0),
                released: Condvar::new(),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }

        fn release(&self, n: usize) {
            *self.permits.lock().unwrap() += n;
            self.released.notify_all();
        }
    }

    impl ChunkSource for GatedSource {
        fn len(&self) -> u64 {
            self.data.len() as u64
        }

        fn read_at(&self, offset: u64, length: u64) -> ViewerResult<Vec<u8>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let deadline = Instant::now() + Duration::from_secs(10);
            let mut permits = self.permits.lock().unwrap();
            while *permits == 0 {
                let left = deadline.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    self.in_flight.fetch_sub(1, Ordering::SeqCst);
                    return Err(ViewerError::Detached);
                }
                permits = self.released.wait_timeout(permits, left).unwrap().0;
            }
            *permits -= 1;
            drop(permits);

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let start = offset as usize;
            let end = (offset + length).min(self.len()) as usize;
            Ok(self.data[start..end].to_vec())
        }

        fn describe(&self) -> String {
            "gated".to_string()
        }
    }

    fn collect_arrivals(service: &mut HexViewerService, expected: usize) -> Vec<ViewerEvent> {
        let deadline = Instant::now() + WAIT;
        let mut events = Vec::new();
        while events.len() < expected && Instant::now() < deadline {
            events.extend(service.wait_events(Duration::from_millis(200)));
        }
        events
    }

    #[test]
    fn test_bytes_match_file_after_arrival() {
        let data = pattern_bytes(3 * CS + 1234);
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(&data).unwrap();
        tmp.flush().unwrap();

        let mut service = HexViewerService::new();
        let tab = service.open_path(tmp.path(), "evidence").unwrap().tab;

        let probes = [0u64, 17, CS, 2 * CS + 5, 3 * CS, 3 * CS + 1233];
        for &i in &probes {
            assert_eq!(service.request_byte(&tab, i).unwrap(), None);
        }

        let events = collect_arrivals(&mut service, 4);
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| matches!(e, ViewerEvent::ChunkArrived { .. })));

        for &i in &probes {
            assert_eq!(service.request_byte(&tab, i).unwrap(), Some(data[i as usize]));
        }
        // Past the end stays a miss and schedules nothing
        assert_eq!(service.request_byte(&tab, 3 * CS + 1234).unwrap(), None);
        let stats = service.stats(&tab).unwrap();
        assert_eq!(stats.cached_chunks, 4);
        assert_eq!(stats.cached_bytes, 3 * CS + 1234);
        assert_eq!(stats.pending + stats.active, 0);
    }

    #[test]
    fn test_duplicate_requests_enqueue_once() {
        let source = GatedSource::new(pattern_bytes(2 * CS));
        let mut service = HexViewerService::new();
        let tab = service.open_file(source.clone(), "dup").unwrap().tab;

        assert_eq!(service.request_byte(&tab, 10).unwrap(), None);
        assert_eq!(service.request_byte(&tab, 20).unwrap(), None);
        assert_eq!(service.request_byte(&tab, CS - 1).unwrap(), None);

        let stats = service.stats(&tab).unwrap();
        assert_eq!(stats.requested, 1);
        assert_eq!(stats.pending + stats.active, 1);

        source.release(1);
        let events = collect_arrivals(&mut service, 1);
        assert_eq!(events.len(), 1);
        assert_eq!(service.request_byte(&tab, 20).unwrap(), Some(pattern_bytes(21)[20]));
    }

    #[test]
    fn test_at_most_four_reads_in_flight() {
        let data = pattern_bytes(10 * CS);
        let source = GatedSource::new(data.clone());
        let mut service = HexViewerService::new();
        let tab = service.open_file(source.clone(), "ceiling").unwrap().tab;

        for i in 0..10 {
            service.request_byte(&tab, i * CS).unwrap();
        }
        let stats = service.stats(&tab).unwrap();
        assert_eq!(stats.active, 4);
        assert_eq!(stats.pending, 6);
        assert_eq!(stats.requested, 10);

        source.release(1);
        let events = collect_arrivals(&mut service, 1);
        assert_eq!(events.len(), 1);
        let stats = service.stats(&tab).unwrap();
        assert_eq!(stats.active, 4);
        assert_eq!(stats.pending, 5);

        source.release(100);
        let mut arrived = events.len();
        arrived += collect_arrivals(&mut service, 9).len();
        assert_eq!(arrived, 10);
        assert!(source.max_in_flight.load(Ordering::SeqCst) <= 4);

        for i in 0..10 {
            assert_eq!(service.request_byte(&tab, i * CS + 3).unwrap(), Some(data[(i * CS + 3) as usize]));
        }
    }

    #[test]
    fn test_late_result_after_close_is_dropped() {
        let source = GatedSource::new(pattern_bytes(CS));
        let mut service = HexViewerService::new();
        let tab = service.open_file(source.clone(), "closing").unwrap().tab;

        service.request_byte(&tab, 0).unwrap();
        assert!(service.close_file(&tab));
        assert!(!service.is_open(&tab));

        source.release(1);
        assert!(service.wait_events(Duration::from_millis(300)).is_empty());
        assert!(matches!(service.stats(&tab), Err(ViewerError::UnknownTab(_))));
        assert!(!service.close_file(&tab));
    }

    #[test]
    fn test_late_result_for_replaced_session_is_dropped() {
        let old = GatedSource::new(pattern_bytes(CS));
        let mut service = HexViewerService::new();
        let tab = service.open_file(old.clone(), "reused").unwrap().tab;
        service.request_byte(&tab, 0).unwrap();

        let replacement = Arc::new(MemorySource::new("new", vec![0xEEu8; 64]));
        let new_tag = service.open_file(replacement, tab.clone()).unwrap();
        assert_eq!(new_tag.tab, tab);

        old.release(1);
        assert!(service.wait_events(Duration::from_millis(300)).is_empty());
        let stats = service.stats(&tab).unwrap();
        assert_eq!(stats.cached_chunks, 0);
        assert_eq!(stats.file_size, 64);
    }

    #[test]
    fn test_read_failure_reports_and_allows_retry() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(&pattern_bytes(1000)).unwrap();
        tmp.flush().unwrap();

        let source = Arc::new(FileSource::open(tmp.path()).unwrap());
        source.detach();

        let mut service = HexViewerService::new();
        let tab = service.open_file(source, "revoked").unwrap().tab;
        assert_eq!(service.request_byte(&tab, 5).unwrap(), None);

        let events = service.wait_events(WAIT);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ViewerEvent::ChunkError { tab: t, offset, message } => {
                assert_eq!(t, &tab);
                assert_eq!(*offset, 0);
                assert!(message.contains("detached"));
            }
            other => panic!("unexpected event {:?}", other),
        }
        let stats = service.stats(&tab).unwrap();
        assert_eq!(stats.requested, 0);
        assert_eq!(stats.active, 0);

        // Retry once the debounce window has passed
        std::thread::sleep(Duration::from_millis(crate::viewer::DEBOUNCE_MS + 20));
        service.request_byte(&tab, 5).unwrap();
        assert_eq!(service.stats(&tab).unwrap().requested, 1);
        assert_eq!(service.wait_events(WAIT).len(), 1);
    }

    #[test]
    fn test_eviction_through_service() {
        let data = pattern_bytes(6 * CS);
        let mut service = HexViewerService::new();
        let tab = service
            .open_with_limits(
                Arc::new(MemorySource::new("big", data)),
                "evict",
                CacheLimits {
                    max_cache_bytes: 4 * CS,
                },
            )
            .unwrap()
            .tab;

        for i in 0..4 {
            service.request_byte(&tab, i * CS).unwrap();
        }
        assert_eq!(collect_arrivals(&mut service, 4).len(), 4);
        assert_eq!(service.stats(&tab).unwrap().cached_chunks, 4);

        service.request_byte(&tab, 4 * CS).unwrap();
        assert_eq!(collect_arrivals(&mut service, 1).len(), 1);

        let stats = service.stats(&tab).unwrap();
        assert_eq!(stats.cached_chunks, 3);
        assert!(stats.cached_bytes <= stats.max_cache_bytes);
    }

    #[test]
    fn test_search_spans_chunks_and_cache() {
        let mut data = vec![0u8; 2 * CS as usize];
        data[(CS - 2) as usize..(CS + 3) as usize].copy_from_slice(b"MAGIC");
        data[100..105].copy_from_slice(b"magic");

        let mut service = HexViewerService::new();
        let tab = service.open_file(Arc::new(MemorySource::new("s", data)), "search").unwrap().tab;

        let result = service
            .request_search(&tab, "MAGIC", SearchKind::Ascii, &SearchOptions::default())
            .unwrap();
        assert_eq!(result.indices, vec![CS - 2]);
        assert_eq!(result.pattern_len, 5);
        assert!(!result.truncated);

        // Same answer once chunk 0 is cached
        service.request_byte(&tab, 0).unwrap();
        assert_eq!(collect_arrivals(&mut service, 1).len(), 1);
        let options = SearchOptions {
            ignore_case: true,
            max_results: None,
        };
        let result = service.request_search(&tab, "MAGIC", SearchKind::Ascii, &options).unwrap();
        assert_eq!(result.indices, vec![100, CS - 2]);

        let result = service
            .request_search(&tab, "4D 41 47", SearchKind::Hex, &options)
            .unwrap();
        assert_eq!(result.indices, vec![CS - 2]);
    }

    #[test]
    fn test_search_limits() {
        let mut service = HexViewerService::new();
        let tab = service
            .open_file(Arc::new(MemorySource::new("zeros", vec![0u8; 2000])), "cap")
            .unwrap()
            .tab;

        let result = service
            .request_search(&tab, "00", SearchKind::Hex, &SearchOptions::default())
            .unwrap();
        assert_eq!(result.indices.len(), 1000);
        assert_eq!(result.indices, (0..1000).collect::<Vec<u64>>());
        assert!(result.truncated);

        let options = SearchOptions {
            ignore_case: false,
            max_results: Some(5),
        };
        let result = service.request_search(&tab, "00", SearchKind::Hex, &options).unwrap();
        assert_eq!(result.indices, vec![0, 1, 2, 3, 4]);
        assert!(result.truncated);

        let result = service
            .request_search(&tab, "", SearchKind::Ascii, &SearchOptions::default())
            .unwrap();
        assert!(result.indices.is_empty());

        assert!(matches!(
            service.request_search(&tab, "0", SearchKind::Hex, &SearchOptions::default()),
            Err(ViewerError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_exactly_limit_matches_is_not_truncated() {
        let mut data = vec![0u8; 1000];
        data.extend_from_slice(&[0xFF; 500]);
        let mut service = HexViewerService::new();
        let tab = service
            .open_file(Arc::new(MemorySource::new("exact", data)), "exact")
            .unwrap()
            .tab;

        let result = service
            .request_search(&tab, "00", SearchKind::Hex, &SearchOptions::default())
            .unwrap();
        assert_eq!(result.indices.len(), 1000);
        assert!(!result.truncated);

        let options = SearchOptions {
            ignore_case: false,
            max_results: Some(500),
        };
        let result = service.request_search(&tab, "FF", SearchKind::Hex, &options).unwrap();
        assert_eq!(result.indices.len(), 500);
        assert_eq!(result.indices[0], 1000);
        assert!(!result.truncated);
    }

    #[test]
    fn test_stalled_tab_does_not_block_other_tabs() {
        let stalled = GatedSource::new(pattern_bytes(4 * CS));
        let mut service = HexViewerService::new();
        let slow = service.open_file(stalled.clone(), "slow").unwrap().tab;
        for i in 0..4 {
            service.request_byte(&slow, i * CS).unwrap();
        }
        assert_eq!(service.stats(&slow).unwrap().active, 4);

        // Still open: the other tab reads on its own pool
        let data = pattern_bytes(CS);
        let fast = service
            .open_file(Arc::new(MemorySource::new("fast", data.clone())), "fast")
            .unwrap()
            .tab;
        service.request_byte(&fast, 7).unwrap();
        let events = service.wait_events(Duration::from_secs(2));
        assert_eq!(
            events,
            vec![ViewerEvent::ChunkArrived {
                tab: fast.clone(),
                offset: 0
            }]
        );

        // And after the stalled tab is closed
        assert!(service.close_file(&slow));
        let other = service
            .open_file(Arc::new(MemorySource::new("other", data.clone())), "other")
            .unwrap()
            .tab;
        service.request_byte(&other, 0).unwrap();
        let events = service.wait_events(Duration::from_secs(2));
        assert_eq!(
            events,
            vec![ViewerEvent::ChunkArrived {
                tab: other.clone(),
                offset: 0
            }]
        );
        assert_eq!(service.request_byte(&other, 9).unwrap(), Some(data[9]));

        stalled.release(100);
        assert!(service.wait_events(Duration::from_millis(300)).is_empty());
    }

    #[test]
    fn test_range_requests_are_bounded() {
        let mut service = HexViewerService::new();
        let tab = service
            .open_with_limits(
                Arc::new(MemorySource::new("wide", pattern_bytes(8 * CS))),
                "wide",
                CacheLimits {
                    max_cache_bytes: 4 * CS,
                },
            )
            .unwrap()
            .tab;

        assert!(matches!(
            service.hex_rows(&tab, 0, usize::MAX / 8),
            Err(ViewerError::InvalidLength { offset: 0, .. })
        ));
        assert!(matches!(
            service.request_range(&tab, 0, 64 * 1024 * 1024),
            Err(ViewerError::RangeTooLarge { .. })
        ));
        assert!(matches!(
            service.hex_rows(&tab, CS, (3 * CS) as usize / BYTES_PER_ROW),
            Err(ViewerError::RangeTooLarge { .. })
        ));
        let stats = service.stats(&tab).unwrap();
        assert_eq!(stats.requested, 0);
        assert_eq!(stats.pending + stats.active, 0);

        // Hashing covers a selection of any size through windows
        let hash = service.hash_range(&tab, 0, 8 * CS, "crc32").unwrap();
        assert_eq!(hash.length, 8 * CS);
    }

    #[test]
    fn test_hash_range_matches_direct_digest() {
        let data = pattern_bytes(CS + 500);
        let mut service = HexViewerService::new();
        let tab = service
            .open_file(Arc::new(MemorySource::new("h", data.clone())), "hash")
            .unwrap()
            .tab;

        let hash = service.hash_range(&tab, 100, CS, "sha256").unwrap();
        assert_eq!(hash.length, CS);
        assert_eq!(hash.hash, hex::encode(Sha256::digest(&data[100..(100 + CS) as usize])));
        assert_eq!(hash.algorithm, "SHA-256");

        // Clamped at end of file
        let tail = service.hash_range(&tab, CS, 10_000, "md5").unwrap();
        assert_eq!(tail.length, 500);

        assert!(matches!(
            service.hash_range(&tab, 0, 10, "rot13"),
            Err(ViewerError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_hex_rows_fill_in() {
        let data = b"MZ\x90\x00This program cannot be run in DOS mode.".to_vec();
        let mut service = HexViewerService::new();
        let tab = service.open_file(Arc::new(MemorySource::new("pe", data)), "rows").unwrap().tab;

        let rows = service.hex_rows(&tab, 3, 4).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| !r.complete));
        assert_eq!(rows[0].hex.matches("??").count(), 16);

        assert_eq!(collect_arrivals(&mut service, 1).len(), 1);
        let rows = service.hex_rows(&tab, 0, 4).unwrap();
        assert!(rows.iter().all(|r| r.complete));
        assert!(rows[0].hex.starts_with("4D 5A 90 00"));
        assert_eq!(rows[0].ascii, "MZ..This program");
    }

    #[test]
    fn test_unknown_tab() {
        let mut service = HexViewerService::new();
        let tab = TabKey::from("missing");
        assert!(matches!(service.request_byte(&tab, 0), Err(ViewerError::UnknownTab(_))));
        assert!(matches!(service.set_viewport(&tab, 0), Err(ViewerError::UnknownTab(_))));
    }
}
