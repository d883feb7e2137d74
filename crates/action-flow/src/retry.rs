//! Retry/backoff executor

use crate::errors::ExhaustedRetries;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Attempt-count-and-delay schedule for retried operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    backoff_multiplier: u32,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            backoff_multiplier: 2,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_attempts` (at least one) and default delays
    pub fn new(max_attempts: u32) -> Self {
        Self::default().with_max_attempts(max_attempts)
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: u32) -> Self {
        self.backoff_multiplier = multiplier.max(1);
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay slept before `attempt` (1-based); zero for the first attempt.
    ///
    /// `base_delay * multiplier^(attempt-2)`, capped at `max_delay`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = self
            .backoff_multiplier
            .saturating_pow(attempt.saturating_sub(2));
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(factor)).min(max_ms))
    }

    /// Every delay slept by a permanently failing operation, in order
    pub fn schedule(&self) -> Vec<Duration> {
        (2..=self.max_attempts)
            .map(|attempt| self.delay_before(attempt))
            .collect()
    }
}

/// Run `op` until it succeeds or `policy.max_attempts` is spent.
///
/// `op` receives the 1-based attempt number. Nothing is rolled back between
/// attempts; the operation owns its own idempotency.
pub async fn execute<T, E, F, Fut>(
    label: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, ExhaustedRetries<E>>
where
    E: std::error::Error + 'static,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(label, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if attempt >= policy.max_attempts => {
                warn!(label, attempt, error = %err, "retries exhausted");
                return Err(ExhaustedRetries {
                    label: label.to_string(),
                    attempts: attempt,
                    source: err,
                });
            }
            Err(err) => {
                let delay = policy.delay_before(attempt + 1);
                warn!(
                    label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[derive(Debug, thiserror::Error)]
    #[error("boom #{0}")]
    struct Boom(u32);

    #[test]
    fn default_schedule_is_two_then_four_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.schedule(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
        assert_eq!(policy.delay_before(1), Duration::ZERO);
    }

    #[test]
    fn delays_are_capped() {
        let policy = RetryPolicy::new(12).with_max_delay(Duration::from_secs(60));
        assert_eq!(policy.delay_before(7), Duration::from_secs(60));
        assert_eq!(policy.delay_before(12), Duration::from_secs(60));
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let policy = RetryPolicy::new(0);
        assert_eq!(policy.max_attempts(), 1);
        assert!(policy.schedule().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn permanently_failing_op_runs_exactly_max_attempts() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<(), _> = execute("login", &RetryPolicy::default(), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(Boom(attempt)) }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.attempts, 3);
        assert_eq!(err.label, "login");
        assert_eq!(err.source.0, 3);
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_a_later_attempt() {
        let started = Instant::now();
        let value = execute("login", &RetryPolicy::default(), |attempt| async move {
            if attempt < 2 {
                Err(Boom(attempt))
            } else {
                Ok(attempt)
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }
}
