//! Bounded retry of optimistic-concurrency conflicts

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::{FacadeError, Result};

/// Backoff for conflict retries
///
/// The defaults are the platform's standard conflict retry: five attempts,
/// 10ms apart with 10% jitter.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first
    pub steps: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each attempt
    pub factor: f64,
    /// Random extra delay, as a fraction of the current delay
    pub jitter: f64,
    /// Upper bound for the delay
    pub max_delay: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            steps: 5,
            initial_delay: Duration::from_millis(10),
            factor: 1.0,
            jitter: 0.1,
            max_delay: None,
        }
    }
}

impl RetryConfig {
    /// Base delay (before jitter) after `attempt` failed attempts
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let delay = self.initial_delay.mul_f64(self.factor.max(1.0).powi(exponent));
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }

    /// Reject settings that could never make progress
    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(FacadeError::InvalidConfig(
                "statusRetry.steps must be at least 1".to_string(),
            ));
        }
        if !self.factor.is_finite() || self.factor < 1.0 {
            return Err(FacadeError::InvalidConfig(format!(
                "statusRetry.factor must be >= 1.0, got {}",
                self.factor
            )));
        }
        if !self.jitter.is_finite() || self.jitter < 0.0 {
            return Err(FacadeError::InvalidConfig(format!(
                "statusRetry.jitter must be >= 0, got {}",
                self.jitter
            )));
        }
        Ok(())
    }

    fn jittered(&self, attempt: u32) -> Duration {
        let delay = self.delay_for(attempt);
        if self.jitter <= 0.0 {
            return delay;
        }
        let extra = rand::rng().random_range(0.0..self.jitter);
        delay.mul_f64(1.0 + extra)
    }
}

/// The last error after retries ran out or a non-conflict error occurred
#[derive(Debug)]
pub struct RetryFailure {
    pub attempts: u32,
    pub error: FacadeError,
}

/// Run `op` until it succeeds, fails with a non-conflict error, or runs out of attempts
pub async fn retry_on_conflict<T, F, Fut>(
    config: &RetryConfig,
    mut op: F,
) -> std::result::Result<T, RetryFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let steps = config.steps.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_conflict() && attempt < steps => {
                let delay = config.jittered(attempt);
                tracing::debug!(
                    attempt,
                    max = steps,
                    delay_ms = delay.as_millis() as u64,
                    "Conflict, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => {
                return Err(RetryFailure {
                    attempts: attempt,
                    error,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn conflict() -> FacadeError {
        FacadeError::Conflict {
            kind: "Facade".to_string(),
            name: "default/web".to_string(),
            message: "stale".to_string(),
        }
    }

    fn fast() -> RetryConfig {
        RetryConfig {
            initial_delay: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_delay_growth() {
        let config = RetryConfig {
            steps: 6,
            initial_delay: Duration::from_millis(10),
            factor: 2.0,
            jitter: 0.0,
            max_delay: Some(Duration::from_millis(50)),
        };

        assert_eq!(config.delay_for(1), Duration::from_millis(10));
        assert_eq!(config.delay_for(2), Duration::from_millis(20));
        assert_eq!(config.delay_for(3), Duration::from_millis(40));
        assert_eq!(config.delay_for(4), Duration::from_millis(50));
    }

    #[test]
    fn test_default_is_flat() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(1), config.delay_for(4));

        let jittered = config.jittered(1);
        assert!(jittered >= Duration::from_millis(10));
        assert!(jittered <= Duration::from_millis(11));
    }

    #[test]
    fn test_validate() {
        assert!(RetryConfig::default().validate().is_ok());

        let zero = RetryConfig {
            steps: 0,
            ..Default::default()
        };
        insta::assert_snapshot!(
            zero.validate().unwrap_err().to_string(),
            @"invalid configuration: statusRetry.steps must be at least 1"
        );

        let shrinking = RetryConfig {
            factor: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            shrinking.validate(),
            Err(FacadeError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_retries_conflicts_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = retry_on_conflict(&fast(), move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(conflict())
            } else {
                Ok("done")
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_steps() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let failure = retry_on_conflict(&fast(), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(conflict())
        })
        .await
        .unwrap_err();

        assert_eq!(failure.attempts, 5);
        assert!(failure.error.is_conflict());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let failure = retry_on_conflict(&fast(), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(FacadeError::NotFound {
                kind: "Facade".to_string(),
                name: "default/web".to_string(),
            })
        })
        .await
        .unwrap_err();

        assert_eq!(failure.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
