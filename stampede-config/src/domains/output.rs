//! Result output configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Print the human-readable summary to stdout when the run ends
    #[serde(default = "crate::domains::utils::default_true")]
    pub summary: bool,

    /// Write the full run result as JSON to this path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_json: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            summary: true,
            report_json: None,
        }
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(ref path) = self.report_json {
            if path.as_os_str().is_empty() {
                return Err(self.validation_error("report_json cannot be an empty path"));
            }
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "output"
    }
}
