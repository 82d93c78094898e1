//! Bounded retry with exponential backoff and jitter.

use crate::error::GenerationError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// How often and how patiently to retry a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 20_000,
            max_jitter_ms: 1_000,
        }
    }
}

impl RetryPolicy {
    /// `attempts` tries with no waiting in between.
    pub fn immediate(attempts: u32) -> Self {
        Self {
            max_attempts: attempts,
            base_delay_ms: 0,
            max_delay_ms: 0,
            max_jitter_ms: 0,
        }
    }

    /// Delay before retrying after failed attempt `attempt` (1-based),
    /// without jitter: `min(max, base * 2^(attempt - 1))`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let scaled = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        Duration::from_millis(scaled)
    }

    /// Base delay plus a random jitter of up to `max_jitter_ms`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter = if self.max_jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.max_jitter_ms)
        };
        self.base_delay(attempt) + Duration::from_millis(jitter)
    }
}

type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

/// Runs an operation under a [`RetryPolicy`].
#[derive(Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    sleeper: Sleeper,
}

impl std::fmt::Debug for Backoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backoff")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Backoff {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, std::thread::sleep)
    }

    /// Substitute the sleep function, e.g. to record delays in tests.
    pub fn with_sleeper(
        policy: RetryPolicy,
        sleeper: impl Fn(Duration) + Send + Sync + 'static,
    ) -> Self {
        Self {
            policy,
            sleeper: Arc::new(sleeper),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Call `op` with the 1-based attempt number until it succeeds, fails
    /// fatally, or the attempt budget runs out. The last error is returned.
    pub fn run<T>(
        &self,
        label: &str,
        mut op: impl FnMut(u32) -> Result<T, GenerationError>,
    ) -> Result<T, GenerationError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.policy.delay(attempt);
                    tracing::warn!(
                        label,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "generation failed, retrying"
                    );
                    (self.sleeper)(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn delays_double_and_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay(1), Duration::from_millis(1_000));
        assert_eq!(policy.base_delay(2), Duration::from_millis(2_000));
        assert_eq!(policy.base_delay(5), Duration::from_millis(16_000));
        assert_eq!(policy.base_delay(6), Duration::from_millis(20_000));
        assert_eq!(policy.base_delay(60), Duration::from_millis(20_000));
    }

    #[test]
    fn jitter_stays_within_bound() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let delay = policy.delay(1);
            assert!(delay >= Duration::from_millis(1_000));
            assert!(delay <= Duration::from_millis(2_000));
        }
    }

    #[test]
    fn transient_errors_retry_until_budget() {
        let slept = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&slept);
        let policy = RetryPolicy {
            max_jitter_ms: 0,
            ..RetryPolicy::default()
        };
        let backoff = Backoff::with_sleeper(policy, move |d| {
            record.lock().expect("lock").push(d);
        });

        let mut calls = 0;
        let result: Result<(), _> = backoff.run("test", |_| {
            calls += 1;
            Err(GenerationError::Transient("503".to_string()))
        });

        assert_eq!(calls, 3);
        assert!(matches!(result, Err(GenerationError::Transient(_))));
        assert_eq!(
            *slept.lock().expect("lock"),
            vec![Duration::from_millis(1_000), Duration::from_millis(2_000)]
        );
    }

    #[test]
    fn fatal_errors_stop_immediately() {
        let backoff = Backoff::new(RetryPolicy::immediate(5));
        let mut calls = 0;
        let result: Result<(), _> = backoff.run("test", |_| {
            calls += 1;
            Err(GenerationError::Fatal("no key".to_string()))
        });
        assert_eq!(calls, 1);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_output_is_retried_and_can_recover() {
        let backoff = Backoff::new(RetryPolicy::immediate(3));
        let result = backoff.run("test", |attempt| {
            if attempt < 3 {
                Err(GenerationError::Malformed("not json".to_string()))
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(result, Ok(3));
    }
}
