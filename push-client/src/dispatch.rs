//! Request dispatch: concurrency limit, retry, and cancellation.
//!
//! Every API call goes through [`Dispatcher::execute`]. A call:
//!
//! 1. checks its cancellation token,
//! 2. builds a fresh request,
//! 3. waits for one of the dispatcher's permits,
//! 4. performs the exchange,
//! 5. on a network failure, waits the retry delay and starts over.
//!
//! Steps 3–5 each race the token, so cancellation is observed while waiting
//! for a permit, mid-exchange, and mid-delay. Only [`TransportError`]s are
//! retried. Any HTTP status counts as a completed exchange.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::transport::{HttpRequest, HttpResponse, Transport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Bounded-concurrency request executor.
///
/// Share one dispatcher (behind an `Arc`) between all handles that should
/// count against the same limit.
pub struct Dispatcher<T: Transport> {
    transport: T,
    permits: Arc<Semaphore>,
    retry_delay: Duration,
    user_agent: String,
}

impl<T: Transport> Dispatcher<T> {
    /// Create a dispatcher over `transport` with limits from `config`.
    pub fn new(transport: T, config: &ClientConfig) -> Self {
        Self {
            transport,
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            retry_delay: config.retry_delay,
            user_agent: config.user_agent.clone(),
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Permits not currently held.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run a request with retry.
    ///
    /// `build` is called once per attempt. Returns the first completed
    /// exchange, or the last transport error once `max_attempts` (at least
    /// one) have failed.
    pub async fn execute<F>(
        &self,
        mut build: F,
        max_attempts: u32,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse>
    where
        F: FnMut() -> Result<HttpRequest> + Send,
    {
        let attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            let request = build()?.header("User-Agent", self.user_agent.as_str());
            tracing::debug!(
                "dispatch {:?} {} (attempt {}/{})",
                request.method,
                request.url.path(),
                attempt,
                attempts
            );

            match self.exchange_once(request, cancel).await {
                Err(ClientError::Transport(e)) if attempt < attempts => {
                    tracing::warn!(
                        "request failed (attempt {}/{}): {}; retrying in {:?}",
                        attempt,
                        attempts,
                        e,
                        self.retry_delay
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                        _ = tokio::time::sleep(self.retry_delay) => {}
                    }
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn exchange_once(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            permit = self.permits.acquire() => permit.map_err(|_| ClientError::Cancelled)?,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            result = self.transport.exchange(request) => result.map_err(ClientError::Transport),
        }
    }
}
