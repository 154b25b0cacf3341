//! HTTP configuration

use stampede_config::domains::http::HttpConfig as ConfigHttpConfig;
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connection establishment timeout
    pub connect_timeout: Duration,

    /// Maximum number of redirects to follow
    pub max_redirects: u32,

    /// User agent string
    pub user_agent: String,

    /// Whether to verify SSL certificates
    pub verify_ssl: bool,

    /// Maximum idle connections kept per host
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        ConfigHttpConfig::default().into()
    }
}

impl From<ConfigHttpConfig> for HttpConfig {
    fn from(config: ConfigHttpConfig) -> Self {
        Self {
            timeout: config.timeout,
            connect_timeout: config.connect_timeout,
            max_redirects: config.max_redirects,
            user_agent: config.user_agent,
            verify_ssl: config.verify_ssl,
            pool_max_idle_per_host: config.pool_max_idle_per_host,
        }
    }
}
