//! Memoized cache file loading.
//!
//! [`LoadedCaches`] keeps recently loaded [`PpdCache`] objects keyed by
//! path, so request threads asking for the same printer share one immutable
//! object instead of re-reading the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use moka::sync::Cache;
use tracing::debug;

use super::PpdCache;
use crate::error::Result;
use crate::telemetry;

/// Default number of resident cache objects.
pub const DEFAULT_CAPACITY: u64 = 64;

/// Path-keyed cache of loaded [`PpdCache`] objects.
#[derive(Clone)]
pub struct LoadedCaches {
    cache: Cache<PathBuf, Arc<PpdCache>>,
}

impl Default for LoadedCaches {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LoadedCaches {
    /// Create a loader holding at most `capacity` objects.
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Cache object for `path`, loading the file on a miss.
    ///
    /// Failed loads are not remembered; the next call retries.
    pub fn get(&self, path: impl AsRef<Path>) -> Result<Arc<PpdCache>> {
        let path = path.as_ref();
        if let Some(pc) = self.cache.get(path) {
            metrics::counter!(telemetry::LOADED_HITS_TOTAL).increment(1);
            return Ok(pc);
        }

        metrics::counter!(telemetry::LOADED_MISSES_TOTAL).increment(1);
        let pc = Arc::new(PpdCache::load(path)?);
        self.cache.insert(path.to_path_buf(), Arc::clone(&pc));
        debug!(path = %path.display(), "cached PPD cache object");
        Ok(pc)
    }

    /// Make an already built object available under `path`.
    pub fn insert(&self, path: impl Into<PathBuf>, pc: PpdCache) -> Arc<PpdCache> {
        let pc = Arc::new(pc);
        self.cache.insert(path.into(), Arc::clone(&pc));
        pc
    }

    /// Drop the object for `path`, e.g. after the file was rewritten.
    pub fn invalidate(&self, path: impl AsRef<Path>) {
        self.cache.invalidate(path.as_ref());
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.cache.contains_key(path.as_ref())
    }
}
