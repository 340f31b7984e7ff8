use std::future::Future;
use std::time::Duration;

use bytes::Bytes;

use super::{Payload, Transport};
use crate::config::Endpoint;
use crate::protocol::error::Result;

/// Pause between a failed attempt and its retry.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Retry discipline for transient transport failures.
///
/// Only errors for which [`GatewayError::is_retryable`] holds
/// (`Unreachable`, `Timeout`) are retried, each after the same fixed
/// backoff. Total attempts = `max_retries + 1`.
///
/// [`GatewayError::is_retryable`]: crate::protocol::GatewayError::is_retryable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// A single attempt, no retry.
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Worst-case wall time of [`run`](Self::run) when every attempt is cut
    /// off at `per_attempt`.
    pub fn budget(&self, per_attempt: Duration) -> Duration {
        per_attempt.saturating_mul(self.attempts()) + self.backoff.saturating_mul(self.max_retries)
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// The last error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        endpoint = label,
                        attempt,
                        error = %e,
                        backoff_ms = self.backoff.as_millis() as u64,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Sends `payload` using the endpoint's timeout and retry policy.
pub async fn send_with_retry(
    transport: &dyn Transport,
    endpoint: &Endpoint,
    payload: Payload,
) -> Result<Bytes> {
    endpoint
        .retry_policy()
        .run(endpoint.address(), || {
            transport.send(endpoint, payload.clone(), endpoint.timeout())
        })
        .await
}
