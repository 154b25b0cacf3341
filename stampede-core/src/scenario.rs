//! Scenario definitions: the scripted journey every virtual user walks
//!
//! A scenario is an immutable ordered list of steps. Each step issues one
//! request built from `{placeholder}` templates over the session context,
//! checks the response status, and may copy response fields back into the
//! context for later steps. The built-in [`Scenario::storefront`] journey
//! mirrors a typical e-commerce flow; custom journeys load from YAML.

use crate::types::HttpMethod;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating a scenario
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid scenario: {0}")]
    Invalid(String),
}

/// Copies a value out of a step's response body into the session context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extract {
    /// Context key to store the value under.
    pub key: String,

    /// JSON pointer into the response body, e.g. `/products/0/id`.
    pub pointer: String,
}

impl Extract {
    pub fn new(key: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            pointer: pointer.into(),
        }
    }
}

/// One unit of scripted work within a scenario.
///
/// Step names double as metric keys in the final report and must be unique
/// within a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,

    #[serde(default)]
    pub method: HttpMethod,

    /// Path template relative to the base URL; `{key}` placeholders are
    /// filled from the session context.
    pub path: String,

    /// Optional JSON body template, placeholder-substituted the same way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<JsonValue>,

    /// Status code the response must carry for the step's check to pass.
    #[serde(default = "default_expect_status")]
    pub expect_status: u16,

    /// Context key that must hold a non-empty value for this step to run.
    /// When it is absent the step is skipped, which is not an error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<String>,

    /// Response fields to carry into the context on a passed check.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extract: Vec<Extract>,

    /// Think time after this step; falls back to the configured default.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub pause: Option<Duration>,
}

fn default_expect_status() -> u16 {
    200
}

impl Step {
    /// Create a step expecting a 200 response, with no body or extractions.
    pub fn new(name: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
            body: None,
            expect_status: default_expect_status(),
            requires: None,
            extract: Vec::new(),
            pause: None,
        }
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_requires(mut self, key: impl Into<String>) -> Self {
        self.requires = Some(key.into());
        self
    }

    pub fn with_extract(mut self, key: impl Into<String>, pointer: impl Into<String>) -> Self {
        self.extract.push(Extract::new(key, pointer));
        self
    }

    pub fn with_expect_status(mut self, status: u16) -> Self {
        self.expect_status = status;
        self
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = Some(pause);
        self
    }
}

/// An immutable, ordered list of steps shared read-only by all sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse and validate a scenario from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load and validate a scenario from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serialize the scenario back to YAML.
    pub fn to_yaml(&self) -> Result<String, ScenarioError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject scenarios the runner cannot execute sensibly: no steps, unnamed
    /// steps, duplicate step names, or paths not rooted at `/`.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.name.is_empty() {
            return Err(ScenarioError::Invalid("scenario name cannot be empty".into()));
        }
        if self.steps.is_empty() {
            return Err(ScenarioError::Invalid(format!(
                "scenario '{}' has no steps",
                self.name
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for step in &self.steps {
            if step.name.is_empty() {
                return Err(ScenarioError::Invalid("step name cannot be empty".into()));
            }
            if !seen.insert(step.name.as_str()) {
                return Err(ScenarioError::Invalid(format!(
                    "duplicate step name '{}'",
                    step.name
                )));
            }
            if !step.path.starts_with('/') {
                return Err(ScenarioError::Invalid(format!(
                    "step '{}' path must start with '/', got '{}'",
                    step.name, step.path
                )));
            }
        }
        Ok(())
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.name.as_str())
    }

    /// The built-in e-commerce journey: browse, log in, search for a product,
    /// view it, add it to the cart, check out, pay.
    ///
    /// Search extracts the first product hit; the view/cart/checkout/payment
    /// steps are data-dependent, so an empty search result skips the rest of
    /// the journey without failing it.
    pub fn storefront() -> Self {
        Self {
            name: "storefront".to_string(),
            steps: vec![
                Step::new("homepage", HttpMethod::Get, "/"),
                Step::new("login", HttpMethod::Post, "/login").with_body(json!({
                    "username": "{username}",
                    "password": "{password}",
                })),
                Step::new("search", HttpMethod::Get, "/search/{search_term}")
                    .with_extract("product_id", "/products/0/id"),
                Step::new("product", HttpMethod::Get, "/product/{product_id}")
                    .with_requires("product_id"),
                Step::new("cart", HttpMethod::Post, "/cart")
                    .with_requires("product_id")
                    .with_body(json!({
                        "product_id": "{product_id}",
                        "quantity": 1,
                    }))
                    .with_extract("cart_id", "/cart_id"),
                Step::new("checkout", HttpMethod::Post, "/checkout")
                    .with_requires("cart_id")
                    .with_body(json!({
                        "cart_id": "{cart_id}",
                    }))
                    .with_extract("order_id", "/order_id"),
                Step::new("payment", HttpMethod::Post, "/payment")
                    .with_requires("order_id")
                    .with_body(json!({
                        "method": "creditcard",
                        "order_id": "{order_id}",
                    })),
            ],
        }
    }
}
