//! Bounded retry with a constant delay
//!
//! Every network operation the engine performs goes through [`RetryPolicy`]:
//! IP discovery, zone listing and record updates. Failures are values here,
//! never propagated errors.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::EngineConfig;

/// Fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: usize,
    /// Delay between two attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Build the policy described by the engine configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.max_retries, Duration::from_secs(config.retry_delay_secs))
    }

    /// Run `attempt` until it succeeds or the budget is exhausted
    ///
    /// Each failure is logged as a warning. There is no delay after the last
    /// attempt.
    ///
    /// # Returns
    ///
    /// - `Some(T)`: The first successful result
    /// - `None`: Every attempt failed
    pub async fn run<T, F, Fut>(&self, operation: &str, subject: &str, mut attempt: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = crate::Result<T>>,
    {
        for n in 1..=self.max_attempts {
            match attempt().await {
                Ok(value) => return Some(value),
                Err(e) => {
                    warn!(
                        operation,
                        subject,
                        attempt = n,
                        max_attempts = self.max_attempts,
                        "{} of {} failed in {}: {}",
                        n,
                        self.max_attempts,
                        operation,
                        e
                    );

                    if n < self.max_attempts {
                        warn!("Retrying in {} seconds...", self.delay.as_secs());
                        tokio::time::sleep(self.delay).await;
                    }
                }
            }
        }

        None
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
