//! Point-in-time views over accumulated metrics

use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accumulated state of one rate series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateStats {
    /// Samples recorded with the flag set.
    pub flagged: u64,

    /// All samples recorded.
    pub total: u64,
}

impl RateStats {
    /// Share of flagged samples; 0 when the series is empty, so an untouched
    /// rate never divides by zero.
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.flagged as f64 / self.total as f64
        }
    }

    pub fn unflagged(&self) -> u64 {
        self.total - self.flagged
    }

    pub(crate) fn observe(&mut self, flagged: bool) {
        self.total += 1;
        if flagged {
            self.flagged += 1;
        }
    }
}

/// Latency distribution summary in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub count: u64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
}

impl LatencySummary {
    pub(crate) fn from_histogram(hist: &Histogram<u64>) -> Self {
        Self {
            count: hist.len(),
            min: hist.min(),
            max: hist.max(),
            mean: hist.mean(),
            p50: hist.value_at_quantile(0.50),
            p90: hist.value_at_quantile(0.90),
            p95: hist.value_at_quantile(0.95),
            p99: hist.value_at_quantile(0.99),
        }
    }
}

/// A consistent point-in-time view of everything a sink has accumulated.
///
/// Snapshots own cloned histograms rather than summaries so threshold
/// evaluation can ask for any percentile deterministically.
pub struct MetricsSnapshot {
    counters: BTreeMap<String, u64>,
    rates: BTreeMap<String, RateStats>,
    histograms: BTreeMap<String, Histogram<u64>>,
}

impl MetricsSnapshot {
    pub(crate) fn new(
        counters: BTreeMap<String, u64>,
        rates: BTreeMap<String, RateStats>,
        histograms: BTreeMap<String, Histogram<u64>>,
    ) -> Self {
        Self {
            counters,
            rates,
            histograms,
        }
    }

    /// Counter value, 0 when the counter was never touched.
    pub fn counter(&self, metric: &str) -> u64 {
        self.counters.get(metric).copied().unwrap_or(0)
    }

    /// Rate series state, empty when the series was never touched.
    pub fn rate_stats(&self, metric: &str) -> RateStats {
        self.rates.get(metric).copied().unwrap_or_default()
    }

    pub fn histogram(&self, metric: &str) -> Option<&Histogram<u64>> {
        self.histograms.get(metric)
    }

    /// Latency summary for a metric, None when no samples were recorded.
    pub fn latency_summary(&self, metric: &str) -> Option<LatencySummary> {
        self.histograms
            .get(metric)
            .filter(|hist| !hist.is_empty())
            .map(LatencySummary::from_histogram)
    }

    /// Summaries of every latency series with at least one sample.
    pub fn latency_summaries(&self) -> BTreeMap<String, LatencySummary> {
        self.histograms
            .iter()
            .filter(|(_, hist)| !hist.is_empty())
            .map(|(name, hist)| (name.clone(), LatencySummary::from_histogram(hist)))
            .collect()
    }

    pub fn counters(&self) -> &BTreeMap<String, u64> {
        &self.counters
    }

    pub fn rates(&self) -> &BTreeMap<String, RateStats> {
        &self.rates
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.rates.is_empty() && self.histograms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_of_empty_series_is_zero() {
        let stats = RateStats::default();
        assert_eq!(stats.rate(), 0.0);
        assert_eq!(stats.total, 0);
    }

    #[test]
    fn test_rate_arithmetic() {
        let mut stats = RateStats::default();
        for _ in 0..1000 {
            stats.observe(true);
        }
        for _ in 0..99_000 {
            stats.observe(false);
        }
        assert_eq!(stats.total, 100_000);
        assert_eq!(stats.unflagged(), 99_000);
        assert_eq!(stats.rate(), 0.01);
    }

    #[test]
    fn test_missing_metrics_read_as_empty() {
        let snapshot = MetricsSnapshot::new(BTreeMap::new(), BTreeMap::new(), BTreeMap::new());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.counter("errors"), 0);
        assert_eq!(snapshot.rate_stats("http_req_failed").rate(), 0.0);
        assert!(snapshot.latency_summary("http_req_duration").is_none());
    }
}
