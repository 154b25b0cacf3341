//! Ramp scheduler: reconciles live sessions against the stage profile
//!
//! Every tick the scheduler compares the number of live sessions with the
//! profile's target for the current elapsed time, spawning the deficit or
//! cancelling the surplus. Cancellation is newest-first: the surplus
//! sessions that started last are asked to stop first, so long-running
//! early sessions get the best chance to finish their journey.
//!
//! When the profile is exhausted (or an external shutdown arrives) the
//! scheduler drains: it stops spawning, cancels everything still live and
//! waits for every session task to exit before returning.

use crate::session::{SessionFactory, SessionHandle, SessionId};
use stampede_core::stage::StageProfile;
use stampede_metrics::{names, MetricSink};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// What a finished run looked like from the scheduler's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSummary {
    /// Wall-clock time from first tick to full drain.
    pub elapsed: Duration,

    /// Sessions ever spawned.
    pub sessions_started: u64,

    /// Most sessions live at any tick.
    pub peak_active: usize,
}

/// Drives session concurrency along a [`StageProfile`].
pub struct RampScheduler {
    profile: StageProfile,
    tick_interval: Duration,
    factory: Arc<dyn SessionFactory>,
    sink: Arc<MetricSink>,
}

impl RampScheduler {
    pub fn new(
        profile: StageProfile,
        tick_interval: Duration,
        factory: Arc<dyn SessionFactory>,
        sink: Arc<MetricSink>,
    ) -> Self {
        Self {
            profile,
            tick_interval,
            factory,
            sink,
        }
    }

    /// Run the profile to completion (or external shutdown), then drain.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> SchedulerSummary {
        let started = Instant::now();
        let total = self.profile.total_duration();

        let mut active: Vec<SessionHandle> = Vec::new();
        let mut retiring: Vec<SessionHandle> = Vec::new();
        let mut next_id: SessionId = 0;
        let mut sessions_started: u64 = 0;
        let mut peak_active = 0;

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("shutdown requested, draining sessions");
                        break;
                    }
                    continue;
                }
            }

            let elapsed = started.elapsed();
            if elapsed >= total {
                break;
            }

            // Sessions that ended on their own just get reaped.
            active.retain(|handle| !handle.is_finished());
            retiring.retain(|handle| !handle.is_finished());

            let target = self.profile.target_at(elapsed) as usize;
            if active.len() < target {
                let deficit = target - active.len();
                debug!(
                    elapsed_s = elapsed.as_secs_f64(),
                    target,
                    live = active.len(),
                    spawning = deficit,
                    "ramping up"
                );
                for _ in 0..deficit {
                    next_id += 1;
                    active.push(self.launch(next_id));
                    sessions_started += 1;
                }
            } else if active.len() > target {
                let surplus = active.len() - target;
                debug!(
                    elapsed_s = elapsed.as_secs_f64(),
                    target,
                    live = active.len(),
                    cancelling = surplus,
                    "ramping down"
                );
                for _ in 0..surplus {
                    if let Some(handle) = active.pop() {
                        handle.cancel();
                        retiring.push(handle);
                    }
                }
            }

            if active.len() > peak_active {
                peak_active = active.len();
            }
        }

        info!(live = active.len(), "profile complete, draining sessions");
        for handle in &active {
            handle.cancel();
        }
        for handle in active {
            handle.join().await;
        }
        for handle in retiring {
            handle.join().await;
        }

        SchedulerSummary {
            elapsed: started.elapsed(),
            sessions_started,
            peak_active,
        }
    }

    /// Spawn one session task wired to the factory and the sink.
    fn launch(&self, id: SessionId) -> SessionHandle {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let factory = Arc::clone(&self.factory);
        let sink = Arc::clone(&self.sink);

        sink.incr(names::VUS_STARTED);
        let task = tokio::spawn(async move {
            use crate::runner::SessionStatus;

            match factory.run(id, cancel_rx).await {
                Ok(outcome) => match outcome.status {
                    SessionStatus::Completed => sink.incr(names::VUS_COMPLETED),
                    SessionStatus::Aborted => sink.incr(names::VUS_ABORTED),
                    SessionStatus::Cancelled => sink.incr(names::VUS_CANCELLED),
                },
                Err(error) => {
                    warn!(session = id, error = %error, "session failed to start");
                    sink.incr(names::VUS_FAILED_TO_START);
                }
            }
        });

        SessionHandle::new(id, cancel_tx, task)
    }
}
