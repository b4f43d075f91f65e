//! Error types for the hex viewer core

use std::fmt;
use std::io;

/// Result type alias for viewer operations
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Errors that can occur while building requests, reading chunks or searching
#[derive(Debug)]
pub enum ViewerError {
    /// I/O error (open/seek/read on the source)
    Io(io::Error),
    /// Chunk offset is not a multiple of the chunk size
    MisalignedOffset(u64),
    /// Request or chunk length is zero, too large, or overflows the offset range
    InvalidLength { offset: u64, length: u64 },
    /// Range spans more chunks than the cache can hold at once
    RangeTooLarge { start: u64, length: u64, max: u64 },
    /// No session is bound to this tab key
    UnknownTab(String),
    /// Search pattern could not be parsed
    InvalidPattern(String),
    /// Hash algorithm name not recognised
    UnsupportedAlgorithm(String),
    /// Background reader pool could not be created
    WorkerPool(String),
    /// Source handle was revoked
    Detached,
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::Io(e) => write!(f, "I/O error: {}", e),
            ViewerError::MisalignedOffset(offset) => {
                write!(f, "Chunk offset {} is not chunk-aligned", offset)
            }
            ViewerError::InvalidLength { offset, length } => {
                write!(f, "Invalid length {} at offset {}", length, offset)
            }
            ViewerError::RangeTooLarge { start, length, max } => write!(
                f,
                "Range of {} bytes at offset {} exceeds the {} byte range limit",
                length, start, max
            ),
            ViewerError::UnknownTab(tab) => write!(f, "No file open for tab '{}'", tab),
            ViewerError::InvalidPattern(e) => write!(f, "Invalid search pattern: {}", e),
            ViewerError::UnsupportedAlgorithm(e) => write!(f, "Unsupported hash algorithm: {}", e),
            ViewerError::WorkerPool(e) => write!(f, "Worker pool error: {}", e),
            ViewerError::Detached => write!(f, "Source file handle has been detached"),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ViewerError {
    fn from(err: io::Error) -> Self {
        ViewerError::Io(err)
    }
}

impl From<rayon::ThreadPoolBuildError> for ViewerError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        ViewerError::WorkerPool(err.to_string())
    }
}
