//! Stage profiles: the declarative load ramp
//!
//! A profile is an ordered list of `(duration, target)` stages plus a start
//! concurrency. [`StageProfile::target_at`] turns it into a total function of
//! elapsed time, which is the single source of truth the scheduler reconciles
//! against.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// One leg of a load ramp: over `duration`, move the concurrency target to
/// `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// How long this stage lasts. Must be positive.
    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// Concurrency target at the end of the stage.
    pub target: u32,
}

impl Stage {
    pub fn new(duration: Duration, target: u32) -> Self {
        Self { duration, target }
    }
}

/// How the target moves inside a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RampMode {
    /// Interpolate linearly from the previous stage's end value to this
    /// stage's target over the stage duration.
    #[default]
    Linear,

    /// Jump to the stage target at the start of the stage and hold it.
    Step,
}

/// Errors raised when constructing a stage profile
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("stage profile must contain at least one stage")]
    Empty,

    #[error("stage {index} has zero duration")]
    ZeroDuration { index: usize },
}

/// A staged ramp, immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct StageProfile {
    start: u32,
    stages: Vec<Stage>,
    mode: RampMode,
    total: Duration,
}

impl StageProfile {
    /// Build a profile, rejecting empty stage lists and zero-length stages.
    pub fn new(start: u32, stages: Vec<Stage>, mode: RampMode) -> Result<Self, ProfileError> {
        if stages.is_empty() {
            return Err(ProfileError::Empty);
        }
        for (index, stage) in stages.iter().enumerate() {
            if stage.duration.is_zero() {
                return Err(ProfileError::ZeroDuration { index });
            }
        }
        let total = stages.iter().map(|s| s.duration).sum();
        Ok(Self {
            start,
            stages,
            mode,
            total,
        })
    }

    /// Concurrency the ramp begins from at elapsed zero.
    pub fn start_target(&self) -> u32 {
        self.start
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn mode(&self) -> RampMode {
        self.mode
    }

    /// Sum of all stage durations; the scheduler stops spawning after this.
    pub fn total_duration(&self) -> Duration {
        self.total
    }

    /// Highest concurrency the profile ever asks for.
    pub fn peak_target(&self) -> u32 {
        self.stages
            .iter()
            .map(|s| s.target)
            .max()
            .map_or(self.start, |peak| peak.max(self.start))
    }

    /// Concurrency target after `elapsed` time.
    ///
    /// Inside stage `i` the value ramps (or steps) from stage `i-1`'s target
    /// (the start concurrency for the first stage) to stage `i`'s target. At
    /// and past the end of the final stage the target is 0: the run is
    /// draining and no new sessions may start.
    pub fn target_at(&self, elapsed: Duration) -> u32 {
        if elapsed >= self.total {
            return 0;
        }
        let mut from = self.start;
        let mut stage_start = Duration::ZERO;
        for stage in &self.stages {
            let stage_end = stage_start + stage.duration;
            if elapsed < stage_end {
                return match self.mode {
                    RampMode::Step => stage.target,
                    RampMode::Linear => {
                        let fraction = (elapsed - stage_start).as_secs_f64()
                            / stage.duration.as_secs_f64();
                        let delta = stage.target as f64 - from as f64;
                        (from as f64 + delta * fraction).round() as u32
                    }
                };
            }
            from = stage.target;
            stage_start = stage_end;
        }
        // elapsed >= total is handled up front; nothing to reach here.
        0
    }
}
