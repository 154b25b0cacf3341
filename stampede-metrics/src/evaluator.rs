//! Threshold evaluation: pure judgement of a snapshot
//!
//! Evaluation has no side effects and is deterministic: the same thresholds
//! and the same snapshot always produce the same verdicts, in the order the
//! thresholds were configured.

use crate::snapshot::MetricsSnapshot;
use serde::Serialize;
use stampede_core::threshold::{Aggregate, Threshold};

/// Outcome of judging one threshold against a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdVerdict {
    pub threshold: Threshold,

    /// The aggregated value the expression was compared against.
    pub observed: f64,

    pub passed: bool,
}

/// Judge every threshold against the snapshot, preserving input order.
pub fn evaluate(thresholds: &[Threshold], snapshot: &MetricsSnapshot) -> Vec<ThresholdVerdict> {
    thresholds
        .iter()
        .map(|threshold| {
            let observed = observed_value(threshold, snapshot);
            let passed = threshold.expr.op.compare(observed, threshold.expr.bound);
            ThresholdVerdict {
                threshold: threshold.clone(),
                observed,
                passed,
            }
        })
        .collect()
}

pub fn all_passed(verdicts: &[ThresholdVerdict]) -> bool {
    verdicts.iter().all(|v| v.passed)
}

/// Compute the aggregate a threshold asks for.
///
/// Untouched metrics read as empty series: rates are 0, counts are 0 and
/// latency aggregates are 0. `count` prefers a counter of that name, then a
/// histogram's sample count, then a rate series' total.
fn observed_value(threshold: &Threshold, snapshot: &MetricsSnapshot) -> f64 {
    let metric = threshold.metric.as_str();
    match threshold.expr.aggregate {
        Aggregate::Rate => snapshot.rate_stats(metric).rate(),
        Aggregate::Count => observed_count(snapshot, metric) as f64,
        Aggregate::Avg => snapshot.histogram(metric).map_or(0.0, |h| h.mean()),
        Aggregate::Min => snapshot.histogram(metric).map_or(0, |h| h.min()) as f64,
        Aggregate::Max => snapshot.histogram(metric).map_or(0, |h| h.max()) as f64,
        Aggregate::Percentile(p) => snapshot
            .histogram(metric)
            .map_or(0, |h| h.value_at_quantile(p / 100.0)) as f64,
    }
}

fn observed_count(snapshot: &MetricsSnapshot, metric: &str) -> u64 {
    let counter = snapshot.counter(metric);
    if counter > 0 {
        return counter;
    }
    if let Some(hist) = snapshot.histogram(metric) {
        return hist.len();
    }
    snapshot.rate_stats(metric).total
}
