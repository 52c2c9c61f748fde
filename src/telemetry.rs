//! Telemetry metric name constants.
//!
//! Centralised metric names for hoard operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `hoard_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `strategy`: fetch strategy: "network_first", "cache_first", "default", "bypass"
//! - `outcome`: how a request or fetch ended (see each metric)

/// Total intercepted requests.
///
/// Labels: `strategy`, `outcome` ("network" | "cache" | "offline" | "synthesized").
pub const REQUESTS_TOTAL: &str = "hoard_requests_total";

/// Intercept duration in seconds.
///
/// Labels: `strategy`.
pub const REQUEST_DURATION_SECONDS: &str = "hoard_request_duration_seconds";

/// Total lookups that found a stored entry.
///
/// Labels: `strategy`.
pub const CACHE_HITS_TOTAL: &str = "hoard_cache_hits_total";

/// Total lookups that found nothing.
///
/// Labels: `strategy`.
pub const CACHE_MISSES_TOTAL: &str = "hoard_cache_misses_total";

/// Total network fetches issued by strategies.
///
/// Labels: `outcome` ("ok" | "error" | "timeout").
pub const NETWORK_FETCHES_TOTAL: &str = "hoard_network_fetches_total";

/// Total background refreshes spawned by cache-first hits.
///
/// Labels: `outcome` ("stored" | "skipped" | "error").
pub const BACKGROUND_REFRESHES_TOTAL: &str = "hoard_background_refreshes_total";

/// Total entries removed by the expiry scanner.
pub const EVICTIONS_TOTAL: &str = "hoard_evictions_total";

/// Total install attempts.
///
/// Labels: `outcome` ("installed" | "noop" | "failed").
pub const INSTALLS_TOTAL: &str = "hoard_installs_total";

/// Total superseded generations deleted during activation.
pub const GENERATIONS_DELETED_TOTAL: &str = "hoard_generations_deleted_total";
