//! Telemetry metric name constants.
//!
//! Centralised metric names for gateway operations. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `waystation_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider` — provider name (e.g. "antigravity", "zai")
//! - `status` — outcome: "ok" or "error"
//! - `kind` — error taxonomy kind, when applicable

/// Total requests dispatched through `/v1/messages`.
///
/// Labels: `provider`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "waystation_requests_total";

/// Request duration in seconds.
///
/// Labels: `provider`.
pub const REQUEST_DURATION_SECONDS: &str = "waystation_request_duration_seconds";

/// Total tokens consumed, per usage field.
///
/// Labels: `provider`, `direction` ("input" | "output").
pub const TOKENS_TOTAL: &str = "waystation_tokens_total";

/// Total upstream errors classified by [`crate::error::classify`].
///
/// Labels: `kind`.
pub const UPSTREAM_ERRORS_TOTAL: &str = "waystation_upstream_errors_total";

/// Total optimistic-retry resets triggered by the request pipeline.
///
/// Labels: `provider`.
pub const OPTIMISTIC_RETRIES_TOTAL: &str = "waystation_optimistic_retries_total";

/// Total account-cache invalidations (token or project cache).
pub const CACHE_INVALIDATIONS_TOTAL: &str = "waystation_cache_invalidations_total";
