//! Request and response types exchanged with a transport

use serde_json::Value as JsonValue;
use stampede_core::types::HttpMethod;

/// A single outgoing request, fully resolved: absolute URL, JSON body ready
/// to send.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<JsonValue>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }
}

/// The transport-level answer to a request.
///
/// Non-JSON response bodies are carried as a JSON string so extraction and
/// logging have one shape to deal with.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: JsonValue,
}

impl HttpResponse {
    pub fn new(status: u16, body: JsonValue) -> Self {
        Self { status, body }
    }

    /// Whether the status counts against the failure-rate metric.
    pub fn failed(&self) -> bool {
        self.status >= 400
    }

    pub fn ok(&self) -> bool {
        !self.failed()
    }
}

/// Convert a method to its reqwest counterpart.
pub fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Patch => reqwest::Method::PATCH,
    }
}
