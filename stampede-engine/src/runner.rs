//! Scenario execution: one session = one shopper walking the journey
//!
//! The runner owns no mutable state of its own; everything per-session lives
//! in the [`SessionContext`], so a single runner is shared by every virtual
//! user. Each step renders its templates, issues one request through the
//! transport, records metrics, and either carries on, skips, or aborts the
//! session.

use crate::context::{is_empty_value, SessionContext};
use serde_json::{json, Value as JsonValue};
use stampede_core::scenario::{Scenario, Step};
use stampede_http::{HttpCapability, HttpRequest};
use stampede_metrics::{names, MetricSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// What happened to a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Request issued, check passed.
    Passed,

    /// Prerequisite or placeholder value missing; no request was issued.
    Skipped,

    /// Response arrived but carried the wrong status.
    CheckFailed,

    /// The request never produced a response.
    TransportFailed,
}

/// How a whole session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Walked every runnable step.
    Completed,

    /// Stopped early on a failed check or transport error.
    Aborted,

    /// Stopped early because the scheduler asked it to.
    Cancelled,
}

/// Terminal summary of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    pub status: SessionStatus,

    /// Steps that ran and passed their check.
    pub steps_completed: usize,
}

/// Executes the scenario for one virtual user at a time.
pub struct ScenarioRunner {
    scenario: Arc<Scenario>,
    transport: Arc<dyn HttpCapability>,
    sink: Arc<MetricSink>,
    base_url: String,
    think_time: Duration,
    seed: Vec<(String, JsonValue)>,
}

impl ScenarioRunner {
    pub fn new(
        scenario: Arc<Scenario>,
        transport: Arc<dyn HttpCapability>,
        sink: Arc<MetricSink>,
        base_url: impl Into<String>,
        think_time: Duration,
    ) -> Self {
        Self {
            scenario,
            transport,
            sink,
            base_url: base_url.into(),
            think_time,
            seed: Vec::new(),
        }
    }

    /// Add a value every session starts with (credentials, search term).
    pub fn with_seed(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.seed.push((key.into(), value));
        self
    }

    /// Run the whole journey for virtual user `vu`.
    ///
    /// A failed check or transport error aborts the remainder of the
    /// session; a missing prerequisite only skips the step. Cancellation is
    /// honored between steps and during think time, never mid-request.
    pub async fn run_session(
        &self,
        vu: u64,
        mut cancel: watch::Receiver<bool>,
    ) -> SessionOutcome {
        let mut context = SessionContext::new();
        for (key, value) in &self.seed {
            context.insert(key.clone(), value.clone());
        }
        context.insert("vu", json!(vu));
        context.insert("unique_id", json!(Uuid::new_v4().to_string()));

        let mut steps_completed = 0;
        for step in &self.scenario.steps {
            if *cancel.borrow() {
                return SessionOutcome {
                    status: SessionStatus::Cancelled,
                    steps_completed,
                };
            }

            match self.execute_step(step, &mut context).await {
                StepOutcome::Passed => steps_completed += 1,
                StepOutcome::Skipped => {}
                StepOutcome::CheckFailed | StepOutcome::TransportFailed => {
                    return SessionOutcome {
                        status: SessionStatus::Aborted,
                        steps_completed,
                    };
                }
            }

            let pause = step.pause.unwrap_or(self.think_time);
            if !pause.is_zero() && self.cancelled_during(pause, &mut cancel).await {
                return SessionOutcome {
                    status: SessionStatus::Cancelled,
                    steps_completed,
                };
            }
        }

        SessionOutcome {
            status: SessionStatus::Completed,
            steps_completed,
        }
    }

    /// Execute one step against the transport, recording its metrics.
    pub async fn execute_step(&self, step: &Step, context: &mut SessionContext) -> StepOutcome {
        if let Some(ref key) = step.requires {
            if !context.has_value(key) {
                debug!(step = %step.name, missing = %key, "skipping step, prerequisite absent");
                self.sink.incr(names::STEPS_SKIPPED);
                return StepOutcome::Skipped;
            }
        }

        let path = match context.render_str(&step.path) {
            Ok(path) => path,
            Err(missing) => {
                debug!(step = %step.name, placeholder = %missing.name, "skipping step, no value for path placeholder");
                self.sink.incr(names::STEPS_SKIPPED);
                return StepOutcome::Skipped;
            }
        };

        let body = match &step.body {
            Some(template) => match context.render_json(template) {
                Ok(body) => Some(body),
                Err(missing) => {
                    debug!(step = %step.name, placeholder = %missing.name, "skipping step, no value for body placeholder");
                    self.sink.incr(names::STEPS_SKIPPED);
                    return StepOutcome::Skipped;
                }
            },
            None => None,
        };

        let mut request = HttpRequest::new(step.method, join_url(&self.base_url, &path));
        if let Some(body) = body {
            request = request.with_body(body);
        }

        let started = Instant::now();
        let result = self.transport.issue(&request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        self.sink.add_latency(names::HTTP_REQ_DURATION, elapsed_ms);
        self.sink.add_latency(&names::step_duration(&step.name), elapsed_ms);

        match result {
            Ok(response) => {
                self.sink.add_rate(names::HTTP_REQ_FAILED, response.failed());

                let passed = response.status == step.expect_status;
                self.sink.add_rate(names::CHECKS, passed);
                self.sink.add_rate(&names::step_check(&step.name), passed);

                if !passed {
                    warn!(
                        step = %step.name,
                        status = response.status,
                        expected = step.expect_status,
                        "check failed"
                    );
                    self.sink.incr(names::ERRORS);
                    return StepOutcome::CheckFailed;
                }

                for extract in &step.extract {
                    match response.body.pointer(&extract.pointer) {
                        Some(value) if !is_empty_value(value) => {
                            debug!(step = %step.name, key = %extract.key, "extracted value");
                            context.insert(extract.key.clone(), value.clone());
                        }
                        _ => {
                            // Nothing at the pointer: later steps that
                            // require this key will skip themselves.
                            debug!(
                                step = %step.name,
                                key = %extract.key,
                                pointer = %extract.pointer,
                                "extraction found nothing"
                            );
                        }
                    }
                }

                StepOutcome::Passed
            }
            Err(error) => {
                warn!(step = %step.name, error = %error, "transport failure");
                self.sink.add_rate(names::HTTP_REQ_FAILED, true);
                self.sink.add_rate(names::CHECKS, false);
                self.sink.add_rate(&names::step_check(&step.name), false);
                self.sink.incr(names::ERRORS);
                StepOutcome::TransportFailed
            }
        }
    }

    /// Sleep for `pause`, returning true if cancellation arrived first.
    async fn cancelled_during(&self, pause: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(pause) => false,
            result = cancel.changed() => match result {
                Ok(()) => *cancel.borrow(),
                // Controller gone; stop quietly.
                Err(_) => true,
            },
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
