//! Composed resilience pipeline for upstream calls
//!
//! Order, outer to inner: circuit breaker → retry → per-attempt timeout.
//! Cancellation cuts through every layer and is never retried.

mod breaker;
mod retry;

pub use breaker::{CircuitBreaker, CircuitState};
pub use retry::RetryPolicy;

use crate::error::{RegistryError, Result};
use crate::http::{check_status, Fetch, HttpResponse};
use pubdex_config::ResilienceSettings;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// A fetcher wrapped in the full resilience pipeline
pub struct ResilientFetch {
    fetch: Arc<dyn Fetch>,
    breaker: CircuitBreaker,
    policy: RetryPolicy,
    attempt_timeout: Duration,
}

impl ResilientFetch {
    pub fn new(fetch: Arc<dyn Fetch>, settings: &ResilienceSettings) -> Self {
        Self {
            fetch,
            breaker: CircuitBreaker::new(
                settings.breaker_window,
                settings.breaker_min_throughput,
                settings.breaker_open_duration,
            ),
            policy: RetryPolicy::new(settings.retry_count, settings.retry_base_delay),
            attempt_timeout: settings.timeout,
        }
    }

    /// Fetch a URL through the pipeline, returning the checked response.
    ///
    /// The breaker admits or short-circuits the whole call and records its
    /// final outcome; each attempt runs under its own timeout; transient
    /// failures retry with backoff until the budget is spent.
    pub async fn get(&self, url: &Url, cancel: &CancellationToken) -> Result<HttpResponse> {
        self.breaker.try_acquire()?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            if cancel.is_cancelled() {
                return Err(RegistryError::Cancelled);
            }

            match self.attempt(url, cancel).await {
                Ok(response) => {
                    self.breaker.record_success();
                    return Ok(response);
                }
                // Cancellation says nothing about upstream health; it does
                // not feed the breaker window.
                Err(RegistryError::Cancelled) => return Err(RegistryError::Cancelled),
                Err(err) => {
                    if !err.is_transient() || attempt >= self.policy.max_attempts {
                        // A definitive not-found is upstream serving
                        // normally; only real failures feed the window.
                        if matches!(err, RegistryError::NotFound(_)) {
                            self.breaker.record_success();
                        } else {
                            self.breaker.record_failure();
                        }
                        return Err(err);
                    }
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        url = %url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "upstream attempt failed, backing off"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(RegistryError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// One attempt: fetch under the per-attempt deadline, then classify the
    /// status.
    async fn attempt(&self, url: &Url, cancel: &CancellationToken) -> Result<HttpResponse> {
        let fetched = tokio::select! {
            _ = cancel.cancelled() => return Err(RegistryError::Cancelled),
            outcome = tokio::time::timeout(self.attempt_timeout, self.fetch.fetch(url)) => outcome,
        };

        match fetched {
            Ok(result) => {
                let response = result?;
                debug!(url = %url, status = response.status, "upstream responded");
                check_status(response)
            }
            Err(_) => Err(RegistryError::unavailable_transport(format!(
                "attempt timed out after {:?}",
                self.attempt_timeout
            ))),
        }
    }

    /// Breaker state, for readiness reporting.
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }
}
