//! Per-session state and `{placeholder}` template rendering
//!
//! Each virtual user owns one [`SessionContext`]: a flat map of JSON values
//! seeded with its identity (credentials, search term, a unique id) and
//! grown by step extractions. Templates reference values as `{key}`; a key
//! is alphanumeric/underscore, anything else is left as literal text.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use thiserror::Error;

/// A template referenced a context key that holds no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no value for placeholder '{name}'")]
pub struct MissingValue {
    pub name: String,
}

/// Whether a JSON value counts as "nothing there" for prerequisite checks
/// and extraction: null, empty string, empty array or empty object.
///
/// `false` and `0` are real values and do not count as empty.
pub fn is_empty_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Mutable per-session key/value state.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    values: BTreeMap<String, JsonValue>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    /// True when `key` is present and holds a non-empty value.
    pub fn has_value(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(|v| !is_empty_value(v))
    }

    /// Substitute every `{key}` in a string template.
    ///
    /// String values are inserted verbatim; other value types render as
    /// their JSON text. Braces that do not wrap a valid key pass through
    /// unchanged.
    pub fn render_str(&self, template: &str) -> Result<String, MissingValue> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) if is_placeholder_name(&after[..close]) => {
                    let name = &after[..close];
                    let value = self.values.get(name).ok_or_else(|| MissingValue {
                        name: name.to_string(),
                    })?;
                    out.push_str(&scalar_text(value));
                    rest = &after[close + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        Ok(out)
    }

    /// Substitute placeholders throughout a JSON template.
    ///
    /// A string that is exactly one placeholder takes the context value with
    /// its type intact, so `"{quantity}"` can become a number. Any other
    /// string is interpolated as text.
    pub fn render_json(&self, template: &JsonValue) -> Result<JsonValue, MissingValue> {
        match template {
            JsonValue::String(s) => match sole_placeholder(s) {
                Some(name) => self
                    .values
                    .get(name)
                    .cloned()
                    .ok_or_else(|| MissingValue {
                        name: name.to_string(),
                    }),
                None => Ok(JsonValue::String(self.render_str(s)?)),
            },
            JsonValue::Array(items) => {
                let rendered: Result<Vec<_>, _> =
                    items.iter().map(|item| self.render_json(item)).collect();
                Ok(JsonValue::Array(rendered?))
            }
            JsonValue::Object(map) => {
                let mut rendered = serde_json::Map::with_capacity(map.len());
                for (key, value) in map {
                    rendered.insert(key.clone(), self.render_json(value)?);
                }
                Ok(JsonValue::Object(rendered))
            }
            other => Ok(other.clone()),
        }
    }
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The whole string is `{name}` and nothing else.
fn sole_placeholder(s: &str) -> Option<&str> {
    let inner = s.strip_prefix('{')?.strip_suffix('}')?;
    is_placeholder_name(inner).then_some(inner)
}

fn scalar_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
