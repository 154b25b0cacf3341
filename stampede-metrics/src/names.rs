//! Well-known metric names
//!
//! The sink itself is name-agnostic; these are the names the engine records
//! under and the default thresholds refer to.

/// Latency of every issued request, in milliseconds.
pub const HTTP_REQ_DURATION: &str = "http_req_duration";

/// Rate of requests that failed at the transport level or returned a 4xx/5xx.
pub const HTTP_REQ_FAILED: &str = "http_req_failed";

/// Rate of step checks that passed.
pub const CHECKS: &str = "checks";

/// Check failures plus transport failures, across all sessions.
pub const ERRORS: &str = "errors";

/// Steps skipped because a required context value was missing.
pub const STEPS_SKIPPED: &str = "steps_skipped";

pub const VUS_STARTED: &str = "vus_started";
pub const VUS_COMPLETED: &str = "vus_completed";
pub const VUS_ABORTED: &str = "vus_aborted";
pub const VUS_CANCELLED: &str = "vus_cancelled";
pub const VUS_FAILED_TO_START: &str = "vus_failed_to_start";

/// Per-step check rate metric, e.g. `check.login`.
pub fn step_check(step: &str) -> String {
    format!("check.{}", step)
}

/// Per-step latency metric, e.g. `step.login`.
pub fn step_duration(step: &str) -> String {
    format!("step.{}", step)
}
