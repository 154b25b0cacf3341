//! Session identity, the factory seam, and live-session handles

use crate::error::EngineError;
use crate::runner::{ScenarioRunner, SessionOutcome};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Monotonic virtual-user number, unique within a run.
pub type SessionId = u64;

/// Builds and runs sessions on behalf of the scheduler.
///
/// The scheduler only knows this trait; production wires in
/// [`ScenarioSessionFactory`], tests substitute factories with scripted
/// behavior. A factory that fails to produce a session reports the error
/// instead of an outcome, and the scheduler counts it separately from
/// sessions that started and then failed.
#[async_trait::async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    async fn run(
        &self,
        id: SessionId,
        cancel: watch::Receiver<bool>,
    ) -> Result<SessionOutcome, EngineError>;
}

/// The production factory: every session walks the configured scenario.
pub struct ScenarioSessionFactory {
    runner: Arc<ScenarioRunner>,
}

impl ScenarioSessionFactory {
    pub fn new(runner: Arc<ScenarioRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait::async_trait]
impl SessionFactory for ScenarioSessionFactory {
    async fn run(
        &self,
        id: SessionId,
        cancel: watch::Receiver<bool>,
    ) -> Result<SessionOutcome, EngineError> {
        Ok(self.runner.run_session(id, cancel).await)
    }
}

/// Owner's view of one spawned session task.
pub struct SessionHandle {
    pub id: SessionId,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub(crate) fn new(id: SessionId, cancel: watch::Sender<bool>, task: JoinHandle<()>) -> Self {
        Self { id, cancel, task }
    }

    /// Ask the session to stop at its next cancellation point.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// True once the session task has fully exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session task to exit.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}
