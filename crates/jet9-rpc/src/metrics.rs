//! Metric names recorded by the dispatcher.
//!
//! Recording goes through the `metrics` facade; whichever recorder the
//! binary installs (Prometheus in `jet9-server`) picks them up.

/// Dispatched requests (counter, labels: subsystem, action).
pub const REQUESTS_TOTAL: &str = "jet9_requests_total";
/// Error envelopes returned (counter, labels: subsystem, error_type).
pub const ERRORS_TOTAL: &str = "jet9_errors_total";
/// Action run time in seconds (histogram, labels: subsystem, action).
pub const REQUEST_DURATION_SECONDS: &str = "jet9_request_duration_seconds";
