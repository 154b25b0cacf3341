//! Run results: the JSON report shape and the console summary

use chrono::{DateTime, Utc};
use serde::Serialize;
use stampede_metrics::{names, LatencySummary, MetricsSnapshot, RateStats, ThresholdVerdict};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

/// One rate series in the report, with its computed share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateReport {
    pub flagged: u64,
    pub total: u64,
    pub rate: f64,
}

impl From<RateStats> for RateReport {
    fn from(stats: RateStats) -> Self {
        Self {
            flagged: stats.flagged,
            total: stats.total,
            rate: stats.rate(),
        }
    }
}

/// Serializable summary of everything the sink accumulated.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub counters: BTreeMap<String, u64>,
    pub rates: BTreeMap<String, RateReport>,
    pub latencies: BTreeMap<String, LatencySummary>,
}

impl MetricsReport {
    pub fn from_snapshot(snapshot: &MetricsSnapshot) -> Self {
        Self {
            counters: snapshot.counters().clone(),
            rates: snapshot
                .rates()
                .iter()
                .map(|(name, stats)| (name.clone(), RateReport::from(*stats)))
                .collect(),
            latencies: snapshot.latency_summaries(),
        }
    }
}

/// Complete result of one load run.
#[derive(Debug, Clone, Serialize)]
pub struct TestRunResult {
    pub scenario: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Wall-clock run time including the drain.
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,

    pub sessions_started: u64,
    pub peak_active: usize,

    /// True when every threshold held.
    pub passed: bool,

    pub verdicts: Vec<ThresholdVerdict>,
    pub metrics: MetricsReport,
}

/// Render the console summary.
pub fn render_text(result: &TestRunResult) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "\nscenario '{}' finished in {} ({} sessions, peak {} concurrent)",
        result.scenario,
        humantime::format_duration(truncate_to_secs(result.elapsed)),
        result.sessions_started,
        result.peak_active,
    );

    if let Some(latency) = result.metrics.latencies.get(names::HTTP_REQ_DURATION) {
        let _ = writeln!(
            out,
            "\n  http_req_duration  min={}ms avg={:.1}ms p95={}ms max={}ms ({} requests)",
            latency.min, latency.mean, latency.p95, latency.max, latency.count,
        );
    }
    if let Some(failed) = result.metrics.rates.get(names::HTTP_REQ_FAILED) {
        let _ = writeln!(
            out,
            "  http_req_failed    {:.2}% ({} of {})",
            failed.rate * 100.0,
            failed.flagged,
            failed.total,
        );
    }
    if let Some(checks) = result.metrics.rates.get(names::CHECKS) {
        let _ = writeln!(
            out,
            "  checks             {:.2}% passed ({} of {})",
            checks.rate * 100.0,
            checks.flagged,
            checks.total,
        );
    }

    let interesting = [
        names::ERRORS,
        names::STEPS_SKIPPED,
        names::VUS_COMPLETED,
        names::VUS_ABORTED,
        names::VUS_CANCELLED,
    ];
    for name in interesting {
        if let Some(count) = result.metrics.counters.get(name) {
            let _ = writeln!(out, "  {:<18} {}", name, count);
        }
    }

    let _ = writeln!(out, "\nthresholds");
    for verdict in &result.verdicts {
        let mark = if verdict.passed { "✅" } else { "❌" };
        let _ = writeln!(
            out,
            "  {} {} (observed {:.4})",
            mark, verdict.threshold, verdict.observed,
        );
    }

    if result.passed {
        let _ = writeln!(out, "\n✅ all thresholds passed");
    } else {
        let _ = writeln!(out, "\n❌ thresholds failed");
    }

    out
}

/// Write the result as pretty JSON.
pub fn write_json(result: &TestRunResult, path: impl AsRef<Path>) -> Result<(), crate::EngineError> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn truncate_to_secs(duration: Duration) -> Duration {
    Duration::from_secs(duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampede_core::threshold::Threshold;
    use stampede_metrics::{evaluate, MetricSink};

    fn sample_result(passed_run: bool) -> TestRunResult {
        let sink = MetricSink::new();
        for millis in [120, 250, 310, 480, 900] {
            sink.add_latency(names::HTTP_REQ_DURATION, millis);
        }
        sink.add_rate(names::HTTP_REQ_FAILED, !passed_run);
        sink.add_rate(names::HTTP_REQ_FAILED, false);
        sink.add_rate(names::CHECKS, true);
        sink.incr(names::VUS_COMPLETED);

        let snapshot = sink.snapshot();
        let thresholds = vec![
            Threshold::parse(names::HTTP_REQ_FAILED, "rate<0.01").unwrap(),
            Threshold::parse(names::HTTP_REQ_DURATION, "p(95)<1000").unwrap(),
        ];
        let verdicts = evaluate(&thresholds, &snapshot);
        let passed = stampede_metrics::all_passed(&verdicts);

        TestRunResult {
            scenario: "storefront".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            elapsed: Duration::from_secs(330),
            sessions_started: 240,
            peak_active: 100,
            passed,
            verdicts,
            metrics: MetricsReport::from_snapshot(&snapshot),
        }
    }

    #[test]
    fn test_render_text_for_a_passing_run() {
        let result = sample_result(true);
        assert!(result.passed);

        let text = render_text(&result);
        assert!(text.contains("scenario 'storefront' finished in 5m 30s"));
        assert!(text.contains("240 sessions, peak 100 concurrent"));
        assert!(text.contains("http_req_duration"));
        assert!(text.contains("✅ all thresholds passed"));
        assert!(!text.contains("❌"));
    }

    #[test]
    fn test_render_text_marks_failed_thresholds() {
        let result = sample_result(false);
        assert!(!result.passed);

        let text = render_text(&result);
        assert!(text.contains("❌ http_req_failed: rate<0.01"));
        assert!(text.contains("✅ http_req_duration: p(95)<1000"));
        assert!(text.contains("❌ thresholds failed"));
    }

    #[test]
    fn test_write_json_produces_a_parseable_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let result = sample_result(true);
        write_json(&result, &path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["passed"], serde_json::json!(true));
        assert_eq!(parsed["scenario"], serde_json::json!("storefront"));
        assert_eq!(parsed["metrics"]["rates"]["checks"]["rate"], serde_json::json!(1.0));
        assert!(parsed["metrics"]["latencies"]["http_req_duration"]["p95"].is_number());
    }

    #[test]
    fn test_metrics_report_covers_all_series() {
        let result = sample_result(true);
        assert!(result.metrics.counters.contains_key(names::VUS_COMPLETED));
        assert!(result.metrics.rates.contains_key(names::HTTP_REQ_FAILED));
        assert!(result.metrics.latencies.contains_key(names::HTTP_REQ_DURATION));

        let failed = &result.metrics.rates[names::HTTP_REQ_FAILED];
        assert_eq!(failed.total, 2);
        assert_eq!(failed.flagged, 0);
        assert_eq!(failed.rate, 0.0);
    }
}
