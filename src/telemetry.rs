//! Telemetry metric name constants.
//!
//! Centralised metric names for ppdcache operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `ppdcache_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `status`: outcome, "ok" or "error"

/// Total cache objects derived from a PPD document.
pub const BUILDS_TOTAL: &str = "ppdcache_builds_total";

/// Total cache file loads.
///
/// Labels: `status` ("ok" | "error").
pub const LOADS_TOTAL: &str = "ppdcache_loads_total";

/// Total cache file writes.
///
/// Labels: `status` ("ok" | "error").
pub const SAVES_TOTAL: &str = "ppdcache_saves_total";

/// Memoized loader hits (object already resident).
pub const LOADED_HITS_TOTAL: &str = "ppdcache_loaded_hits_total";

/// Memoized loader misses (file read from disk).
pub const LOADED_MISSES_TOTAL: &str = "ppdcache_loaded_misses_total";

/// Outcome label value for a metric.
pub(crate) fn status<T, E>(result: &std::result::Result<T, E>) -> &'static str {
    if result.is_ok() { "ok" } else { "error" }
}
