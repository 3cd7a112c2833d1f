//! Exponential backoff for registry pushes

use apkolock_config::NetworkConfig;
use apkolock_errors::{Error, OpsError};
use std::future::Future;
use std::time::Duration;

/// Backoff schedule: `steps` attempts, sleeping `delay` after the first
/// failure and multiplying the sleep by `factor` after each later one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub delay: Duration,
    pub factor: f64,
    pub steps: u32,
}

impl Backoff {
    #[must_use]
    pub fn from_config(network: &NetworkConfig) -> Self {
        Self {
            delay: network.retry_delay(),
            factor: network.backoff_factor,
            steps: network.retries.max(1),
        }
    }

    /// Sleep before the attempt following `attempt` (1-based)
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        Duration::try_from_secs_f64(self.delay.as_secs_f64() * self.factor.powi(exponent))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_config(&NetworkConfig::default())
    }
}

/// Run `op` until it succeeds or the backoff runs out of steps
///
/// `on_retry` is called with the failed attempt number, the upcoming delay
/// and the error before each sleep.
///
/// # Errors
///
/// Returns `OpsError::RetriesExhausted` carrying every attempt's error.
pub async fn retry<T, F, Fut, R>(backoff: Backoff, mut op: F, mut on_retry: R) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
    R: FnMut(u32, Duration, &Error),
{
    let steps = backoff.steps.max(1);
    let mut errors = Vec::new();
    for attempt in 1..=steps {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt < steps {
                    let delay = backoff.delay_after(attempt);
                    on_retry(attempt, delay, &e);
                    tokio::time::sleep(delay).await;
                }
                errors.push(e.to_string());
            }
        }
    }

    Err(OpsError::RetriesExhausted {
        attempts: errors.len(),
        errors: errors.join("; "),
    }
    .into())
}
