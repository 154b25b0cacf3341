//! Engine error types

use thiserror::Error;

/// Errors raised while assembling or running a load test
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Transport error: {0}")]
    Transport(#[from] stampede_http::HttpError),

    #[error("Configuration error: {0}")]
    Config(#[from] stampede_config::ConfigError),

    #[error("Scenario error: {0}")]
    Scenario(#[from] stampede_core::scenario::ScenarioError),

    #[error("Report IO error: {0}")]
    ReportIo(#[from] std::io::Error),

    #[error("Report serialization error: {0}")]
    ReportSerialize(#[from] serde_json::Error),
}
