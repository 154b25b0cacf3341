//! Metric events: the append-only observations sessions emit

/// A single observation emitted by a running session or the scheduler.
///
/// Events are consumed by [`crate::MetricSink`]; aggregation is commutative,
/// so the order events arrive in never changes the resulting snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricEvent {
    /// One latency sample, in milliseconds.
    Latency { metric: String, millis: u64 },

    /// A counter increment.
    Count { metric: String, delta: u64 },

    /// One boolean sample in a rate series. The series' `rate` is the share
    /// of flagged samples, so what "flagged" means is the metric's choice:
    /// for `http_req_failed` a flagged sample is a failed request, for
    /// `checks` it is a passed check.
    Rate { metric: String, flagged: bool },
}

impl MetricEvent {
    pub fn latency(metric: impl Into<String>, millis: u64) -> Self {
        Self::Latency {
            metric: metric.into(),
            millis,
        }
    }

    pub fn count(metric: impl Into<String>, delta: u64) -> Self {
        Self::Count {
            metric: metric.into(),
            delta,
        }
    }

    pub fn rate(metric: impl Into<String>, flagged: bool) -> Self {
        Self::Rate {
            metric: metric.into(),
            flagged,
        }
    }

    /// The metric this event belongs to.
    pub fn metric(&self) -> &str {
        match self {
            Self::Latency { metric, .. } | Self::Count { metric, .. } | Self::Rate { metric, .. } => {
                metric
            }
        }
    }
}
