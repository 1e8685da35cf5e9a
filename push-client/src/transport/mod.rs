//! Transport abstraction for the push client.
//!
//! This module provides a pluggable HTTP layer that abstracts the underlying
//! client (reqwest, mock for testing).
//!
//! # Design
//!
//! A transport performs exactly one request/response exchange. It never
//! retries, never limits concurrency, and never interprets status codes.
//! Those concerns belong to [`Dispatcher`](crate::Dispatcher) and
//! [`response`](crate::response).
//!
//! A [`TransportError`] means the exchange did not complete. Any HTTP
//! status, including 5xx, is a completed exchange.

mod http;
mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;

use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not reach the server.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request or response body timed out.
    #[error("request timed out")]
    Timeout,

    /// Any other failure before a full response was read.
    #[error("request failed: {0}")]
    RequestFailed(String),
}

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Parameters go in the query string.
    Get,
    /// Parameters go in a form-encoded body.
    Post,
}

/// A single API request.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method.
    pub method: Method,
    /// Endpoint URL, without query string.
    pub url: Url,
    /// Parameters, as query (GET) or form body (POST).
    pub params: Vec<(String, String)>,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// A GET request to `url`.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            params: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// A POST request to `url`.
    pub fn post(url: Url) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(url)
        }
    }

    /// Add a parameter.
    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    /// Add a parameter only when `value` is `Some` and non-empty.
    pub fn param_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.param(key, v),
            _ => self,
        }
    }

    /// Set a header, replacing any previous value.
    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
        self.headers.push((key.to_string(), value.into()));
        self
    }

    /// Look up a parameter value.
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a header value.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Parameter values carry tokens and secrets.
        let keys: Vec<&str> = self.params.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("params", &keys)
            .finish()
    }
}

/// A completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a response from a status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Transport trait for performing API exchanges.
///
/// Implementations handle the underlying HTTP client.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request and return the full response.
    async fn exchange(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
