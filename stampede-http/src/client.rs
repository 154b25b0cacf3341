//! HTTP client implementation

use crate::config::HttpConfig;
use crate::errors::HttpError;
use crate::types::{to_reqwest_method, HttpRequest, HttpResponse};
use reqwest::Client;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Transport seam the session runner drives.
///
/// Production uses [`WebClient`]; tests inject
/// [`MockTransport`](crate::mock::MockTransport).
#[async_trait::async_trait]
pub trait HttpCapability: Send + Sync {
    async fn issue(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Real HTTP transport backed by a shared reqwest client.
///
/// The underlying client is built once and reused for every request, so all
/// sessions share one connection pool instead of paying connection setup on
/// each step.
#[derive(Debug, Clone)]
pub struct WebClient {
    client: Client,
}

impl WebClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a client with specific configuration
    pub fn with_config(config: HttpConfig) -> Result<Self, HttpError> {
        debug!(
            "Creating web client with timeout: {}s",
            config.timeout.as_secs()
        );
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .redirect(reqwest::redirect::Policy::limited(
                config.max_redirects as usize,
            ))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl HttpCapability for WebClient {
    async fn issue(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        debug!("Issuing {} {}", request.method, request.url);

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        debug!("Response received: {} ({} bytes)", status, text.len());

        // Try to parse the response as JSON, fall back to a plain string
        let body = if text.is_empty() {
            JsonValue::Null
        } else {
            match serde_json::from_str::<JsonValue>(&text) {
                Ok(json_data) => json_data,
                Err(_) => JsonValue::String(text),
            }
        };

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_client_builds_with_defaults() {
        assert!(WebClient::new().is_ok());
    }

    #[test]
    fn test_web_client_honors_config() {
        let config = HttpConfig {
            verify_ssl: false,
            max_redirects: 0,
            ..HttpConfig::default()
        };
        assert!(WebClient::with_config(config).is_ok());
    }
}
