//! The Stampede load engine
//!
//! Everything between configuration and verdict lives here: per-session
//! state and templating ([`context`]), step execution ([`runner`]), the
//! concurrency scheduler ([`scheduler`]), and the [`orchestrator`] that
//! assembles a whole run and produces its [`report`].

pub mod context;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod runner;
pub mod scheduler;
pub mod session;

// Re-export main types
pub use context::{is_empty_value, MissingValue, SessionContext};
pub use error::EngineError;
pub use orchestrator::Orchestrator;
pub use report::{render_text, write_json, MetricsReport, RateReport, TestRunResult};
pub use runner::{ScenarioRunner, SessionOutcome, SessionStatus, StepOutcome};
pub use scheduler::{RampScheduler, SchedulerSummary};
pub use session::{ScenarioSessionFactory, SessionFactory, SessionHandle, SessionId};
