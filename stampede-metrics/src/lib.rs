//! Metric collection and threshold evaluation for stampede
//!
//! [`MetricSink`] is the one shared mutable resource in a load test: every
//! session records latency samples, counter increments and rate observations
//! into it concurrently. [`MetricsSnapshot`] is a consistent point-in-time
//! view, and [`evaluator`] judges snapshots against configured thresholds.

pub mod evaluator;
pub mod event;
pub mod names;
pub mod sink;
pub mod snapshot;

// Re-export main types
pub use evaluator::{all_passed, evaluate, ThresholdVerdict};
pub use event::MetricEvent;
pub use sink::MetricSink;
pub use snapshot::{LatencySummary, MetricsSnapshot, RateStats};
