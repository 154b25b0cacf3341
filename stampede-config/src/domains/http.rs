//! HTTP client configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,

    /// Connection establishment timeout
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Maximum number of redirects to follow
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whether to verify SSL certificates
    #[serde(default = "crate::domains::utils::default_true")]
    pub verify_ssl: bool,

    /// Maximum idle connections kept per host
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            verify_ssl: true,
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.timeout.as_millis(), "timeout", self.domain_name())?;
        validate_positive(
            self.connect_timeout.as_millis(),
            "connect_timeout",
            self.domain_name(),
        )?;
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

// Default value functions
fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_redirects() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("stampede/{}", env!("CARGO_PKG_VERSION"))
}

fn default_pool_max_idle_per_host() -> usize {
    10
}
