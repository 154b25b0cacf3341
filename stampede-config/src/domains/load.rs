//! Load shape configuration
//!
//! Controls how many concurrent shoppers run and how their number changes
//! over the course of a test. Either an explicit `stages` list is given, or
//! the classic ramp/sustain/drop profile is synthesized from the four
//! shortcut knobs (`min_users`, `spawn_users`, `sustain`, `ramp_down_users`).

use crate::error::{ConfigError, ConfigResult};
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use stampede_core::stage::{RampMode, Stage, StageProfile};
use std::time::Duration;

/// Load shape configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Concurrency at t=0, before the first stage begins ramping
    #[serde(default)]
    pub start_users: u32,

    /// Explicit stage list; when empty the shortcut knobs below apply
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<Stage>,

    /// Target of the initial warm-up minute
    #[serde(default = "default_min_users")]
    pub min_users: u32,

    /// Target of the spike minute and the sustain plateau
    #[serde(default = "default_spawn_users")]
    pub spawn_users: u32,

    /// How long the plateau at `spawn_users` is held
    #[serde(with = "humantime_serde", default = "default_sustain")]
    pub sustain: Duration,

    /// Target of the final 30 second ramp-down
    #[serde(default = "default_ramp_down_users")]
    pub ramp_down_users: u32,

    /// How targets are interpolated inside a stage
    #[serde(default)]
    pub ramp: RampMode,

    /// How often the scheduler reconciles running sessions with the target
    #[serde(with = "humantime_serde", default = "default_tick_interval")]
    pub tick_interval: Duration,

    /// Think time after each scenario step
    #[serde(with = "humantime_serde", default = "default_think_time")]
    pub think_time: Duration,
}

impl LoadConfig {
    /// Build the stage profile this configuration describes.
    ///
    /// An explicit `stages` list wins; otherwise the shortcut knobs are
    /// expanded into warm-up, spike, sustain and ramp-down stages.
    pub fn stage_profile(&self) -> ConfigResult<StageProfile> {
        let stages = if self.stages.is_empty() {
            vec![
                Stage::new(Duration::from_secs(60), self.min_users),
                Stage::new(Duration::from_secs(60), self.spawn_users),
                Stage::new(self.sustain, self.spawn_users),
                Stage::new(Duration::from_secs(30), self.ramp_down_users),
            ]
        } else {
            self.stages.clone()
        };

        StageProfile::new(self.start_users, stages, self.ramp).map_err(|e| {
            ConfigError::DomainError {
                domain: "load".to_string(),
                message: e.to_string(),
            }
        })
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            start_users: 0,
            stages: Vec::new(),
            min_users: default_min_users(),
            spawn_users: default_spawn_users(),
            sustain: default_sustain(),
            ramp_down_users: default_ramp_down_users(),
            ramp: RampMode::default(),
            tick_interval: default_tick_interval(),
            think_time: default_think_time(),
        }
    }
}

impl Validatable for LoadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.tick_interval.as_millis(),
            "tick_interval",
            self.domain_name(),
        )?;

        // Stage durations and shortcut knobs are checked by profile assembly
        self.stage_profile()?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load"
    }
}

// Default value functions
fn default_min_users() -> u32 {
    10
}

fn default_spawn_users() -> u32 {
    100
}

fn default_sustain() -> Duration {
    Duration::from_secs(180)
}

fn default_ramp_down_users() -> u32 {
    2
}

fn default_tick_interval() -> Duration {
    Duration::from_millis(250)
}

fn default_think_time() -> Duration {
    Duration::from_secs(1)
}
