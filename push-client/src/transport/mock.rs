//! Mock transport for testing.
//!
//! Allows queueing responses and capturing sent requests for verification.

use super::{HttpRequest, HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock transport for testing.
///
/// Replies are served in the order they were queued. With no reply queued,
/// an exchange fails with [`TransportError::ConnectionFailed`].
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    requests: Vec<HttpRequest>,
    replies: VecDeque<Result<HttpResponse, TransportError>>,
    latency: Option<Duration>,
    in_flight: usize,
    max_in_flight: usize,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response to be returned by the next exchange.
    pub fn queue_response(&self, response: HttpResponse) {
        let mut inner = self.inner.lock().unwrap();
        inner.replies.push_back(Ok(response));
    }

    /// Queue a JSON response.
    pub fn queue_json(&self, status: u16, body: serde_json::Value) {
        self.queue_response(HttpResponse::new(status, body.to_string()));
    }

    /// Queue a network failure for the next exchange.
    pub fn queue_failure(&self, error: TransportError) {
        let mut inner = self.inner.lock().unwrap();
        inner.replies.push_back(Err(error));
    }

    /// Make every exchange take `latency` before replying.
    pub fn set_latency(&self, latency: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.latency = Some(latency);
    }

    /// All requests that reached the transport.
    pub fn requests(&self) -> Vec<HttpRequest> {
        let inner = self.inner.lock().unwrap();
        inner.requests.clone()
    }

    /// The last request that reached the transport.
    pub fn last_request(&self) -> Option<HttpRequest> {
        let inner = self.inner.lock().unwrap();
        inner.requests.last().cloned()
    }

    /// Number of requests that reached the transport.
    pub fn request_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.requests.len()
    }

    /// Highest number of exchanges that were in progress at once.
    pub fn max_in_flight(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.max_in_flight
    }

    /// Clear all state (requests, queue, counters).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Decrements the in-flight count even when the exchange future is dropped.
struct InFlight(Arc<Mutex<MockTransportInner>>);

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.0.lock() {
            inner.in_flight -= 1;
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn exchange(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let latency = {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(request);
            inner.in_flight += 1;
            inner.max_in_flight = inner.max_in_flight.max(inner.in_flight);
            inner.latency
        };
        let _guard = InFlight(Arc::clone(&self.inner));

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut inner = self.inner.lock().unwrap();
        inner
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::ConnectionFailed("no reply queued".into())))
    }
}
