//! Pass/fail threshold configuration
//!
//! Thresholds are written in the familiar `aggregate op bound` shorthand,
//! keyed by metric name:
//!
//! ```yaml
//! thresholds:
//!   http_req_failed:
//!     - "rate<0.01"
//!   http_req_duration:
//!     - "p(95)<1000"
//! ```

use crate::error::{ConfigError, ConfigResult};
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use stampede_core::threshold::Threshold;
use std::collections::BTreeMap;

/// Threshold configuration: metric name to expression strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    #[serde(flatten)]
    pub metrics: BTreeMap<String, Vec<String>>,
}

impl ThresholdsConfig {
    /// Parse every configured expression into a typed threshold.
    ///
    /// Metrics are visited in name order, expressions in listed order, so
    /// the verdict report is stable across runs.
    pub fn to_thresholds(&self) -> ConfigResult<Vec<Threshold>> {
        let mut thresholds = Vec::new();
        for (metric, exprs) in &self.metrics {
            for expr in exprs {
                let threshold =
                    Threshold::parse(metric, expr).map_err(|e| ConfigError::DomainError {
                        domain: "thresholds".to_string(),
                        message: format!("{}: {}", metric, e),
                    })?;
                thresholds.push(threshold);
            }
        }
        Ok(thresholds)
    }
}

impl Default for ThresholdsConfig {
    /// The storefront gate: under 1% failed requests, p95 under a second.
    fn default() -> Self {
        let mut metrics = BTreeMap::new();
        metrics.insert(
            "http_req_failed".to_string(),
            vec!["rate<0.01".to_string()],
        );
        metrics.insert(
            "http_req_duration".to_string(),
            vec!["p(95)<1000".to_string()],
        );
        Self { metrics }
    }
}

impl Validatable for ThresholdsConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.to_thresholds().map(|_| ())
    }

    fn domain_name(&self) -> &'static str {
        "thresholds"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampede_core::threshold::{Aggregate, CompareOp};

    #[test]
    fn test_default_thresholds() {
        let thresholds = ThresholdsConfig::default().to_thresholds().unwrap();
        assert_eq!(thresholds.len(), 2);

        // BTreeMap key order: duration before failed
        assert_eq!(thresholds[0].metric, "http_req_duration");
        assert_eq!(thresholds[0].expr.aggregate, Aggregate::Percentile(95.0));
        assert_eq!(thresholds[1].metric, "http_req_failed");
        assert_eq!(thresholds[1].expr.op, CompareOp::Lt);
        assert_eq!(thresholds[1].expr.bound, 0.01);
    }

    #[test]
    fn test_thresholds_parse_from_yaml() {
        let yaml = r#"
http_req_failed:
  - "rate<0.05"
errors:
  - "count<10"
"#;
        let config: ThresholdsConfig = serde_yaml::from_str(yaml).unwrap();
        let thresholds = config.to_thresholds().unwrap();
        assert_eq!(thresholds.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_expression_rejected() {
        let mut config = ThresholdsConfig::default();
        config
            .metrics
            .insert("checks".to_string(), vec!["rate!!0.9".to_string()]);
        assert!(config.validate().is_err());
    }
}
