//! Domain-driven configuration management for Stampede
//!
//! This crate provides modular configuration split by functional domains,
//! with validation, defaults, and environment variable support. Target
//! details (base URL, credentials, search term), load shape, thresholds
//! and output knobs can all be overridden through `STAMPEDE_`-prefixed
//! environment variables.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    http::HttpConfig,
    load::LoadConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    output::OutputConfig,
    target::TargetConfig,
    thresholds::ThresholdsConfig,
    StampedeConfig,
};
