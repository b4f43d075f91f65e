//! Byte and ASCII pattern search for the hex viewer
//!
//! Patterns are typed by the examiner either as hex digits (`"4D 5A"`,
//! `"4d5a"`) or as plain text. Matching itself is a streaming KMP scan,
//! see [`kmp`].

pub mod kmp;

use serde::{Deserialize, Serialize};

use crate::error::{ViewerError, ViewerResult};

pub use kmp::{build_lps, find_pattern_indices, find_pattern_indices_with_limit, PatternMatcher};

/// Maximum number of hits returned by a single search
pub const MAX_SEARCH_MATCHES: usize = 1000;

/// How the search text should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Hex,
    Ascii,
}

/// Options accepted from the UI search box
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// ASCII only: compare with ASCII case folding
    #[serde(default)]
    pub ignore_case: bool,
    /// Override for the default cap of [`MAX_SEARCH_MATCHES`]
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl SearchOptions {
    pub fn limit(&self) -> usize {
        self.max_results.unwrap_or(MAX_SEARCH_MATCHES)
    }
}

/// Search hits for one request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub indices: Vec<u64>,
    pub pattern_len: usize,
    /// True when the cap was reached and later hits were dropped
    pub truncated: bool,
}

/// Convert the UI search text into needle bytes
pub fn parse_pattern(text: &str, kind: SearchKind) -> ViewerResult<Vec<u8>> {
    match kind {
        SearchKind::Ascii => Ok(text.as_bytes().to_vec()),
        SearchKind::Hex => {
            let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            let digits = digits
                .strip_prefix("0x")
                .or_else(|| digits.strip_prefix("0X"))
                .unwrap_or(digits.as_str());
            hex::decode(digits).map_err(|e| ViewerError::InvalidPattern(format!("'{}': {}", text, e)))
        }
    }
}

/// Whether the matcher should fold case for this request
pub fn folds_case(kind: SearchKind, options: &SearchOptions) -> bool {
    kind == SearchKind::Ascii && options.ignore_case
}
