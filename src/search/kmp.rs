//! Knuth-Morris-Pratt byte pattern matching
//!
//! `PatternMatcher` keeps its match state between `feed` calls so a large
//! source can be scanned window by window without re-reading overlaps.

use super::MAX_SEARCH_MATCHES;

/// Build the longest-proper-prefix-suffix table for `pattern`
pub fn build_lps(pattern: &[u8]) -> Vec<usize> {
    let mut lps = vec![0usize; pattern.len()];
    let mut len = 0;
    let mut i = 1;

    while i < pattern.len() {
        if pattern[i] == pattern[len] {
            len += 1;
            lps[i] = len;
            i += 1;
        } else if len != 0 {
            len = lps[len - 1];
        } else {
            lps[i] = 0;
            i += 1;
        }
    }

    lps
}

/// Streaming KMP matcher over a sequence of byte windows
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: Vec<u8>,
    lps: Vec<usize>,
    /// Number of pattern bytes currently matched
    matched: usize,
    /// Compare bytes with ASCII case folding
    fold_case: bool,
    max_count: usize,
    found: Vec<u64>,
    /// A match beyond `max_count` was seen
    truncated: bool,
}

impl PatternMatcher {
    pub fn new(pattern: &[u8], fold_case: bool, max_count: usize) -> Self {
        let pattern: Vec<u8> = if fold_case {
            pattern.iter().map(u8::to_ascii_lowercase).collect()
        } else {
            pattern.to_vec()
        };
        let lps = build_lps(&pattern);

        Self {
            pattern,
            lps,
            matched: 0,
            fold_case,
            max_count,
            found: Vec::new(),
            truncated: false,
        }
    }

    /// Whether scanning further cannot change the result
    pub fn is_done(&self) -> bool {
        self.pattern.is_empty() || self.truncated
    }

    /// True once a match past the cap has been seen and dropped
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Feed the next window; `base` is the absolute offset of `window[0]`.
    /// Windows must be fed in order and without gaps.
    pub fn feed(&mut self, base: u64, window: &[u8]) {
        if self.is_done() {
            return;
        }

        let m = self.pattern.len();
        for (i, &raw) in window.iter().enumerate() {
            let byte = if self.fold_case { raw.to_ascii_lowercase() } else { raw };

            while self.matched > 0 && byte != self.pattern[self.matched] {
                self.matched = self.lps[self.matched - 1];
            }
            if byte == self.pattern[self.matched] {
                self.matched += 1;
            }
            if self.matched == m {
                if self.found.len() >= self.max_count {
                    self.truncated = true;
                    return;
                }
                let end = base + i as u64 + 1;
                self.found.push(end - m as u64);
                // Overlapping matches: fall back instead of resetting
                self.matched = self.lps[m - 1];
            }
        }
    }

    pub fn finish(self) -> Vec<u64> {
        self.found
    }
}

/// Find every start index of `pattern` in `haystack`, capped at 1000 matches
pub fn find_pattern_indices(haystack: &[u8], pattern: &[u8]) -> Vec<usize> {
    find_pattern_indices_with_limit(haystack, pattern, MAX_SEARCH_MATCHES)
}

/// Same as [`find_pattern_indices`] with an explicit match cap
pub fn find_pattern_indices_with_limit(haystack: &[u8], pattern: &[u8], max_count: usize) -> Vec<usize> {
    let mut matcher = PatternMatcher::new(pattern, false, max_count);
    matcher.feed(0, haystack);
    matcher.finish().into_iter().map(|i| i as usize).collect()
}
