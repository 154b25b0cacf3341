//! The metric sink: concurrent accumulation with no lost updates

use crate::event::MetricEvent;
use crate::snapshot::{MetricsSnapshot, RateStats};
use hdrhistogram::Histogram;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Histograms keep 3 significant digits of precision, plenty for
/// millisecond-level latency thresholds.
const LATENCY_SIGFIG: u8 = 3;

fn new_histogram() -> Histogram<u64> {
    // 3 significant digits is always within hdrhistogram's supported range.
    Histogram::new(LATENCY_SIGFIG).expect("failed to create latency histogram")
}

/// Thread-safe accumulator for counters, rate series and latency histograms,
/// keyed by metric name.
///
/// One sink is shared by every session in a run (behind an `Arc`); it owns
/// all of its internal synchronization. Aggregation is commutative: replaying
/// the same events into a fresh sink yields an identical snapshot regardless
/// of interleaving.
pub struct MetricSink {
    counters: RwLock<HashMap<String, u64>>,
    rates: RwLock<HashMap<String, RateStats>>,
    histograms: RwLock<HashMap<String, Histogram<u64>>>,
}

impl MetricSink {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            rates: RwLock::new(HashMap::new()),
            histograms: RwLock::new(HashMap::new()),
        }
    }

    /// Record one event. Never fails; a latency sample beyond the
    /// histogram's trackable range is dropped.
    pub fn record(&self, event: MetricEvent) {
        match event {
            MetricEvent::Latency { metric, millis } => {
                let mut histograms = self.histograms.write();
                let hist = histograms.entry(metric).or_insert_with(new_histogram);
                let _ = hist.record(millis);
            }
            MetricEvent::Count { metric, delta } => {
                *self.counters.write().entry(metric).or_insert(0) += delta;
            }
            MetricEvent::Rate { metric, flagged } => {
                self.rates.write().entry(metric).or_default().observe(flagged);
            }
        }
    }

    /// Record one latency sample in milliseconds.
    pub fn add_latency(&self, metric: &str, millis: u64) {
        self.record(MetricEvent::latency(metric, millis));
    }

    /// Increment a counter by one.
    pub fn incr(&self, metric: &str) {
        self.record(MetricEvent::count(metric, 1));
    }

    /// Record one sample in a rate series.
    pub fn add_rate(&self, metric: &str, flagged: bool) {
        self.record(MetricEvent::rate(metric, flagged));
    }

    /// A consistent point-in-time view. Safe to call at any time, including
    /// while sessions are still recording.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters: BTreeMap<String, u64> = self
            .counters
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        let rates: BTreeMap<String, RateStats> = self
            .rates
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        let histograms: BTreeMap<String, Histogram<u64>> = self
            .histograms
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        MetricsSnapshot::new(counters, rates, histograms)
    }
}

impl Default for MetricSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names;
    use std::sync::Arc;

    #[test]
    fn test_counters_and_rates_accumulate() {
        let sink = MetricSink::new();
        sink.incr(names::ERRORS);
        sink.incr(names::ERRORS);
        sink.record(MetricEvent::count(names::STEPS_SKIPPED, 3));
        sink.add_rate(names::HTTP_REQ_FAILED, true);
        sink.add_rate(names::HTTP_REQ_FAILED, false);
        sink.add_rate(names::HTTP_REQ_FAILED, false);

        let snapshot = sink.snapshot();
        assert_eq!(snapshot.counter(names::ERRORS), 2);
        assert_eq!(snapshot.counter(names::STEPS_SKIPPED), 3);
        let stats = snapshot.rate_stats(names::HTTP_REQ_FAILED);
        assert_eq!(stats.flagged, 1);
        assert_eq!(stats.total, 3);
    }

    #[test]
    fn test_latency_summary_percentiles() {
        let sink = MetricSink::new();
        for millis in 1..=100u64 {
            sink.add_latency(names::HTTP_REQ_DURATION, millis);
        }

        let snapshot = sink.snapshot();
        let summary = snapshot.latency_summary(names::HTTP_REQ_DURATION).unwrap();
        assert_eq!(summary.count, 100);
        assert_eq!(summary.min, 1);
        assert_eq!(summary.max, 100);
        assert_eq!(summary.p50, 50);
        assert_eq!(summary.p95, 95);
    }

    #[test]
    fn test_concurrent_writers_lose_nothing() {
        let sink = Arc::new(MetricSink::new());
        let threads: u64 = 8;
        let per_thread: u64 = 1000;

        std::thread::scope(|scope| {
            for _ in 0..threads {
                let sink = Arc::clone(&sink);
                scope.spawn(move || {
                    for i in 0..per_thread {
                        sink.incr(names::ERRORS);
                        sink.add_rate(names::CHECKS, i % 10 != 0);
                        sink.add_latency(names::HTTP_REQ_DURATION, (i % 250) + 1);
                    }
                });
            }
        });

        let snapshot = sink.snapshot();
        let expected = threads * per_thread;
        assert_eq!(snapshot.counter(names::ERRORS), expected);
        assert_eq!(snapshot.rate_stats(names::CHECKS).total, expected);
        assert_eq!(
            snapshot.latency_summary(names::HTTP_REQ_DURATION).unwrap().count,
            expected
        );
    }

    #[test]
    fn test_replaying_events_is_idempotent_across_sinks() {
        let events: Vec<MetricEvent> = (0..500u64)
            .flat_map(|i| {
                vec![
                    MetricEvent::latency(names::HTTP_REQ_DURATION, (i % 90) + 5),
                    MetricEvent::rate(names::HTTP_REQ_FAILED, i % 50 == 0),
                    MetricEvent::count(names::ERRORS, u64::from(i % 50 == 0)),
                ]
            })
            .collect();

        let first = MetricSink::new();
        let second = MetricSink::new();
        for event in &events {
            first.record(event.clone());
        }
        // Reverse order on the second sink: aggregation must be commutative.
        for event in events.iter().rev() {
            second.record(event.clone());
        }

        let a = first.snapshot();
        let b = second.snapshot();
        assert_eq!(a.counters(), b.counters());
        assert_eq!(a.rates(), b.rates());
        assert_eq!(
            a.latency_summary(names::HTTP_REQ_DURATION),
            b.latency_summary(names::HTTP_REQ_DURATION)
        );
    }

    #[test]
    fn test_snapshot_is_detached_from_later_writes() {
        let sink = MetricSink::new();
        sink.incr(names::ERRORS);
        let before = sink.snapshot();
        sink.incr(names::ERRORS);

        assert_eq!(before.counter(names::ERRORS), 1);
        assert_eq!(sink.snapshot().counter(names::ERRORS), 2);
    }
}
