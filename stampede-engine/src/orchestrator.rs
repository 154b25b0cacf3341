//! Wires configuration, scenario, transport, metrics and scheduler into a
//! single runnable load test.

use crate::report::{MetricsReport, TestRunResult};
use crate::runner::ScenarioRunner;
use crate::scheduler::RampScheduler;
use crate::session::ScenarioSessionFactory;
use crate::{report, EngineError};
use chrono::Utc;
use serde_json::json;
use stampede_config::StampedeConfig;
use stampede_core::scenario::Scenario;
use stampede_http::{HttpCapability, WebClient};
use stampede_metrics::{all_passed, evaluate, MetricSink};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Owns one full load run from assembly to verdicts.
pub struct Orchestrator {
    config: StampedeConfig,
    scenario: Scenario,
    transport_override: Option<Arc<dyn HttpCapability>>,
}

impl Orchestrator {
    pub fn new(config: StampedeConfig, scenario: Scenario) -> Self {
        Self {
            config,
            scenario,
            transport_override: None,
        }
    }

    /// Substitute the transport; used by tests to run fully offline.
    pub fn with_transport(mut self, transport: Arc<dyn HttpCapability>) -> Self {
        self.transport_override = Some(transport);
        self
    }

    /// Run to completion, ignoring external shutdown.
    pub async fn run(&self) -> Result<TestRunResult, EngineError> {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        self.run_with_shutdown(shutdown_rx).await
    }

    /// Run the configured profile, draining early if `shutdown` flips true.
    ///
    /// The report is produced either way: an interrupted run still gets its
    /// thresholds judged over whatever was measured.
    pub async fn run_with_shutdown(
        &self,
        shutdown: watch::Receiver<bool>,
    ) -> Result<TestRunResult, EngineError> {
        let started_at = Utc::now();

        let profile = self.config.load.stage_profile()?;
        let thresholds = self.config.thresholds.to_thresholds()?;
        let total_duration = profile.total_duration();
        let peak_target = profile.peak_target();

        let transport: Arc<dyn HttpCapability> = match &self.transport_override {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(WebClient::with_config(self.config.http.clone().into())?),
        };
        let sink = Arc::new(MetricSink::new());

        let runner = ScenarioRunner::new(
            Arc::new(self.scenario.clone()),
            transport,
            Arc::clone(&sink),
            self.config.target.base_url.clone(),
            self.config.load.think_time,
        )
        .with_seed("username", json!(self.config.target.username))
        .with_seed("password", json!(self.config.target.password))
        .with_seed("search_term", json!(self.config.target.search_term));

        let factory = Arc::new(ScenarioSessionFactory::new(Arc::new(runner)));
        let scheduler = RampScheduler::new(
            profile,
            self.config.load.tick_interval,
            factory,
            Arc::clone(&sink),
        );

        info!(
            scenario = %self.scenario.name,
            base_url = %self.config.target.base_url,
            total_s = total_duration.as_secs(),
            peak = peak_target,
            "starting load run"
        );

        let summary = scheduler.run(shutdown).await;

        let snapshot = sink.snapshot();
        let verdicts = evaluate(&thresholds, &snapshot);
        let passed = all_passed(&verdicts);

        info!(
            elapsed_s = summary.elapsed.as_secs_f64(),
            sessions = summary.sessions_started,
            passed,
            "load run finished"
        );

        let result = TestRunResult {
            scenario: self.scenario.name.clone(),
            started_at,
            finished_at: Utc::now(),
            elapsed: summary.elapsed,
            sessions_started: summary.sessions_started,
            peak_active: summary.peak_active,
            passed,
            verdicts,
            metrics: MetricsReport::from_snapshot(&snapshot),
        };

        if let Some(ref path) = self.config.output.report_json {
            report::write_json(&result, path)?;
            info!(path = %path.display(), "wrote JSON report");
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampede_core::stage::Stage;
    use stampede_core::types::HttpMethod::{Get, Post};
    use stampede_http::MockTransport;
    use stampede_metrics::names;
    use std::time::Duration;

    fn quick_config() -> StampedeConfig {
        let mut config = StampedeConfig::default();
        config.load.stages = vec![Stage::new(Duration::from_millis(400), 2)];
        config.load.ramp = stampede_core::stage::RampMode::Step;
        config.load.tick_interval = Duration::from_millis(25);
        config.load.think_time = Duration::ZERO;
        config
    }

    fn happy_transport() -> Arc<MockTransport> {
        Arc::new(
            MockTransport::new()
                .with_response(Get, "/", 200, json!({}))
                .with_response(Post, "/login", 200, json!({}))
                .with_response(
                    Get,
                    "/search/robot",
                    200,
                    json!({"products": [{"id": "12345"}]}),
                )
                .with_response(Get, "/product/12345", 200, json!({"id": "12345"}))
                .with_response(Post, "/cart", 200, json!({"cart_id": "abc123"}))
                .with_response(Post, "/checkout", 200, json!({"order_id": "order123"}))
                .with_response(Post, "/payment", 200, json!({"status": "paid"})),
        )
    }

    #[tokio::test]
    async fn test_offline_run_passes_default_thresholds() {
        let orchestrator = Orchestrator::new(quick_config(), Scenario::storefront())
            .with_transport(happy_transport());

        let result = orchestrator.run().await.unwrap();

        assert!(result.passed);
        assert!(result.sessions_started >= 2);
        assert_eq!(result.metrics.rates[names::CHECKS].rate, 1.0);
        assert_eq!(result.metrics.rates[names::HTTP_REQ_FAILED].rate, 0.0);
        // Both default thresholds were judged.
        assert_eq!(result.verdicts.len(), 2);
    }

    #[tokio::test]
    async fn test_failing_storefront_fails_the_failure_rate_threshold() {
        let transport = Arc::new(
            MockTransport::new().with_response(Get, "/", 500, json!({"error": "boom"})),
        );
        let orchestrator =
            Orchestrator::new(quick_config(), Scenario::storefront()).with_transport(transport);

        let result = orchestrator.run().await.unwrap();

        assert!(!result.passed);
        assert!(result.metrics.counters[names::VUS_ABORTED] > 0);
        let failed_verdict = result
            .verdicts
            .iter()
            .find(|v| v.threshold.metric == names::HTTP_REQ_FAILED)
            .unwrap();
        assert!(!failed_verdict.passed);
        assert_eq!(failed_verdict.observed, 1.0);
    }

    #[tokio::test]
    async fn test_report_json_is_written_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");

        let mut config = quick_config();
        config.output.report_json = Some(path.clone());
        let orchestrator =
            Orchestrator::new(config, Scenario::storefront()).with_transport(happy_transport());

        let result = orchestrator.run().await.unwrap();
        assert!(result.passed);

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["scenario"], json!("storefront"));
        assert_eq!(parsed["passed"], json!(true));
    }

    #[tokio::test]
    async fn test_external_shutdown_still_produces_a_report() {
        let mut config = quick_config();
        config.load.stages = vec![Stage::new(Duration::from_secs(30), 2)];
        let orchestrator = Orchestrator::new(config, Scenario::storefront())
            .with_transport(happy_transport());

        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let _ = tx.send(true);
        });

        let result = orchestrator.run_with_shutdown(rx).await.unwrap();
        assert!(result.elapsed < Duration::from_secs(10));
        assert_eq!(result.verdicts.len(), 2);
    }
}
