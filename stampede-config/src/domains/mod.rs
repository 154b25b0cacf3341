//! Domain-specific configuration modules

pub mod http;
pub mod load;
pub mod logging;
pub mod output;
pub mod target;
pub mod thresholds;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Stampede configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StampedeConfig {
    /// Target storefront configuration
    #[serde(default)]
    pub target: target::TargetConfig,

    /// Load shape configuration
    #[serde(default)]
    pub load: load::LoadConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Pass/fail threshold configuration
    #[serde(default)]
    pub thresholds: thresholds::ThresholdsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,

    /// Result output configuration
    #[serde(default)]
    pub output: output::OutputConfig,
}

impl StampedeConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.load.validate()?;
        self.http.validate()?;
        self.thresholds.validate()?;
        self.logging.validate()?;
        self.output.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = StampedeConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = StampedeConfig::default();
        assert!(config.validate_all().is_ok());
    }

    #[test]
    fn test_generate_sample_round_trips() {
        let sample = StampedeConfig::generate_sample();
        let parsed: StampedeConfig = serde_yaml::from_str(&sample).unwrap();
        assert!(parsed.validate_all().is_ok());
        assert_eq!(parsed.load.spawn_users, 100);
        assert_eq!(parsed.target.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_partial_yaml_fills_in_defaults() {
        let yaml = r#"
target:
  base_url: "https://shop.example.com"
load:
  spawn_users: 25
"#;
        let config: StampedeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.target.base_url, "https://shop.example.com");
        assert_eq!(config.target.username, "user");
        assert_eq!(config.load.spawn_users, 25);
        assert_eq!(config.load.min_users, 10);
        assert!(config.validate_all().is_ok());
    }
}
