//! Configuration loading and environment variable handling

use crate::domains::StampedeConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "STAMPEDE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<StampedeConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: StampedeConfig = serde_yaml::from_str(&content)?;

        // Apply environment variable overrides
        self.apply_env_overrides(&mut config)?;

        // Validate all domains
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<StampedeConfig> {
        let mut config = StampedeConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<StampedeConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        self.apply_target_overrides(&mut config.target)?;
        self.apply_load_overrides(&mut config.load)?;
        self.apply_http_overrides(&mut config.http)?;
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_output_overrides(&mut config.output)?;
        Ok(())
    }

    /// Apply target config overrides
    fn apply_target_overrides(
        &self,
        config: &mut crate::domains::target::TargetConfig,
    ) -> ConfigResult<()> {
        if let Ok(base_url) = self.get_env_var("BASE_URL") {
            config.base_url = base_url;
        }

        if let Ok(username) = self.get_env_var("USERNAME") {
            config.username = username;
        }

        if let Ok(password) = self.get_env_var("PASSWORD") {
            config.password = password;
        }

        if let Ok(search_term) = self.get_env_var("SEARCH_TERM") {
            config.search_term = search_term;
        }

        Ok(())
    }

    /// Apply load shape overrides
    fn apply_load_overrides(
        &self,
        config: &mut crate::domains::load::LoadConfig,
    ) -> ConfigResult<()> {
        if let Ok(min_users) = self.get_env_var("MIN_USERS") {
            config.min_users = min_users
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid MIN_USERS: {}", e)))?;
        }

        if let Ok(spawn_users) = self.get_env_var("SPAWN_USERS") {
            config.spawn_users = spawn_users
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid SPAWN_USERS: {}", e)))?;
        }

        if let Ok(duration) = self.get_env_var("TEST_DURATION") {
            config.sustain = parse_duration_env("TEST_DURATION", &duration)?;
        }

        if let Ok(down) = self.get_env_var("SUDDEN_USER_DOWN") {
            config.ramp_down_users = down
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid SUDDEN_USER_DOWN: {}", e)))?;
        }

        if let Ok(think_time) = self.get_env_var("THINK_TIME") {
            config.think_time = parse_duration_env("THINK_TIME", &think_time)?;
        }

        Ok(())
    }

    /// Apply HTTP config overrides
    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Ok(timeout) = self.get_env_var("HTTP_TIMEOUT") {
            config.timeout = parse_duration_env("HTTP_TIMEOUT", &timeout)?;
        }

        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Ok(verify_ssl) = self.get_env_var("HTTP_VERIFY_SSL") {
            config.verify_ssl = verify_ssl
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid HTTP_VERIFY_SSL: {}", e)))?;
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            use std::str::FromStr;
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            use std::str::FromStr;
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Apply output config overrides
    fn apply_output_overrides(
        &self,
        config: &mut crate::domains::output::OutputConfig,
    ) -> ConfigResult<()> {
        if let Ok(path) = self.get_env_var("REPORT_JSON") {
            config.report_json = Some(path.into());
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a duration env value written as a humantime span ("3m", "90s").
fn parse_duration_env(name: &str, value: &str) -> ConfigResult<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| ConfigError::EnvError(format!("Invalid {} ({}): {}", name, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_file_with_defaults_for_missing_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "target:\n  base_url: \"http://shop.test:9090\"\nload:\n  min_users: 3"
        )
        .unwrap();

        let config = ConfigLoader::with_prefix("STAMPEDE_FILE_TEST")
            .from_file(file.path())
            .unwrap();
        assert_eq!(config.target.base_url, "http://shop.test:9090");
        assert_eq!(config.load.min_users, 3);
        assert_eq!(config.load.spawn_users, 100);
    }

    #[test]
    fn test_env_overrides_take_precedence() {
        temp_env::with_vars(
            [
                ("STAMPEDE_SPAWN_USERS", Some("40")),
                ("STAMPEDE_TEST_DURATION", Some("2m")),
                ("STAMPEDE_BASE_URL", Some("http://a.example.com")),
            ],
            || {
                let config = ConfigLoader::new().from_env().unwrap();
                assert_eq!(config.load.spawn_users, 40);
                assert_eq!(config.load.sustain, Duration::from_secs(120));
                assert_eq!(config.target.base_url, "http://a.example.com");
            },
        );
    }

    #[test]
    fn test_invalid_env_duration_is_reported() {
        temp_env::with_var("STAMPEDE_TEST_DURATION", Some("three minutes"), || {
            let result = ConfigLoader::new().from_env();
            assert!(matches!(result, Err(ConfigError::EnvError(_))));
        });
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ConfigLoader::new().from_file("/nonexistent/stampede.yaml");
        assert!(matches!(result, Err(ConfigError::FileReadError(_))));
    }
}
