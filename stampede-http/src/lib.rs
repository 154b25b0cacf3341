//! HTTP transport for Stampede
//!
//! This crate provides the transport seam the load engine drives: a real
//! reqwest-backed client for production runs and a scriptable mock for
//! offline tests, both behind the [`HttpCapability`] trait.

pub mod client;
pub mod config;
pub mod errors;
pub mod mock;
pub mod types;

// Re-export main types for convenience
pub use client::{HttpCapability, WebClient};
pub use config::HttpConfig;
pub use errors::HttpError;
pub use mock::MockTransport;
pub use types::{to_reqwest_method, HttpRequest, HttpResponse};

// The method enum lives in the core domain model; re-export it so transport
// users need only this crate.
pub use stampede_core::types::{HttpMethod, HttpMethodError};
