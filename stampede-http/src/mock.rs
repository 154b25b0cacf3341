//! Mock transport for offline tests
//!
//! Answers are keyed by `"METHOD /path"`, matched against the path of the
//! request URL so test code never has to know which port a fixture got.
//! Unregistered paths answer 404, mirroring a storefront that does not know
//! the route.

use crate::client::HttpCapability;
use crate::errors::HttpError;
use crate::types::{HttpRequest, HttpResponse};
use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};
use stampede_core::types::HttpMethod;
use std::collections::HashMap;

enum MockAnswer {
    Respond { status: u16, body: JsonValue },
    Fail(String),
}

/// In-memory transport with scripted answers and a call log.
#[derive(Default)]
pub struct MockTransport {
    answers: HashMap<String, MockAnswer>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for `method path`.
    pub fn with_response(
        mut self,
        method: HttpMethod,
        path: &str,
        status: u16,
        body: JsonValue,
    ) -> Self {
        self.answers
            .insert(answer_key(method, path), MockAnswer::Respond { status, body });
        self
    }

    /// Script a transport failure (connection refused and friends) for
    /// `method path`.
    pub fn with_error(mut self, method: HttpMethod, path: &str, message: &str) -> Self {
        self.answers
            .insert(answer_key(method, path), MockAnswer::Fail(message.to_string()));
        self
    }

    /// Every request seen so far, oldest first, as `"METHOD /path"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

fn answer_key(method: HttpMethod, path: &str) -> String {
    format!("{} {}", method.as_str(), path)
}

fn request_key(request: &HttpRequest) -> Result<String, HttpError> {
    let url = url::Url::parse(&request.url)
        .map_err(|e| HttpError::InvalidUrl(format!("{}: {}", request.url, e)))?;
    Ok(format!("{} {}", request.method.as_str(), url.path()))
}

#[async_trait::async_trait]
impl HttpCapability for MockTransport {
    async fn issue(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let key = request_key(request)?;
        self.calls.lock().push(key.clone());

        match self.answers.get(&key) {
            Some(MockAnswer::Respond { status, body }) => {
                Ok(HttpResponse::new(*status, body.clone()))
            }
            Some(MockAnswer::Fail(message)) => Err(HttpError::ConnectionFailed(message.clone())),
            None => Ok(HttpResponse::new(404, json!({"error": "not found"}))),
        }
    }
}
