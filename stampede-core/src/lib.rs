//! Core domain model for the stampede load generator
//!
//! Scenarios (ordered journey steps), stage profiles (the load ramp) and
//! threshold expressions are plain data here. Execution lives in
//! `stampede-engine`, metric collection in `stampede-metrics`.

pub mod scenario;
pub mod stage;
pub mod threshold;
pub mod types;

// Re-export main types
pub use scenario::{Extract, Scenario, ScenarioError, Step};
pub use stage::{ProfileError, RampMode, Stage, StageProfile};
pub use threshold::{Aggregate, CompareOp, Threshold, ThresholdExpr, ThresholdParseError};
pub use types::{HttpMethod, HttpMethodError};
