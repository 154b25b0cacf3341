//! Target system configuration
//!
//! Describes the storefront under test: where it lives and which credentials
//! and search term the simulated shoppers use.

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};

/// Target system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL every scenario path is resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Username sent by the login step
    #[serde(default = "default_username")]
    pub username: String,

    /// Password sent by the login step
    #[serde(default = "default_password")]
    pub password: String,

    /// Search term used by the product search step
    #[serde(default = "default_search_term")]
    pub search_term: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: default_username(),
            password: default_password(),
            search_term: default_search_term(),
        }
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.base_url, "base_url", self.domain_name())?;
        validate_required_string(&self.username, "username", self.domain_name())?;
        validate_required_string(&self.search_term, "search_term", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_username() -> String {
    "user".to_string()
}

fn default_password() -> String {
    "password".to_string()
}

fn default_search_term() -> String {
    "robot".to_string()
}
