//! ppdcache error types

use std::cell::RefCell;
use std::path::PathBuf;

/// ppdcache error types
#[derive(Debug, thiserror::Error)]
pub enum PpdCacheError {
    // File errors
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Cache file errors
    /// The file is not a cache file, or its declarations are inconsistent.
    #[error("Bad PPD cache file (line {line}): {reason}")]
    BadFormat { line: usize, reason: String },

    /// The magic header is present but carries a different version.
    #[error("Out of date PPD cache file (version {found}, expected {expected})")]
    OutOfDate { found: String, expected: u32 },

    // Data errors
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("IPP encoding error: {0}")]
    Ipp(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl PpdCacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn bad_format(line: usize, reason: impl Into<String>) -> Self {
        Self::BadFormat {
            line,
            reason: reason.into(),
        }
    }

    /// True for malformed cache files (wrong magic, broken counts, truncated data).
    pub fn is_bad_format(&self) -> bool {
        matches!(self, Self::BadFormat { .. })
    }

    /// True when the cache file was written by an incompatible version.
    pub fn is_out_of_date(&self) -> bool {
        matches!(self, Self::OutOfDate { .. })
    }
}

/// Result type alias for ppdcache operations
pub type Result<T> = std::result::Result<T, PpdCacheError>;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Message of the most recent failed build/load/save on this thread.
///
/// Kept for callers that poll a status string after a failing call. Each
/// tracked operation overwrites it; a successful one clears it.
pub fn last_error() -> Option<String> {
    LAST_ERROR.with(|slot| slot.borrow().clone())
}

/// Record the outcome of a tracked operation and pass it through.
pub(crate) fn track<T>(result: Result<T>) -> Result<T> {
    LAST_ERROR.with(|slot| {
        *slot.borrow_mut() = result.as_ref().err().map(ToString::to_string);
    });
    result
}
