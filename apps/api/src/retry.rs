//! Retry with capped exponential backoff.
//!
//! One loop shared by every outbound call site. Each caller supplies a classifier
//! that decides, per failure, whether to give up or which backoff curve to wait on.
//! Attempts are strictly sequential; waiting suspends only the calling task.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// A capped exponential backoff curve: `min(base * factor^attempt, cap)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub base: Duration,
    pub factor: f64,
    pub cap: Duration,
}

impl Backoff {
    pub const fn new(base: Duration, factor: f64, cap: Duration) -> Self {
        Self { base, factor, cap }
    }

    /// Delay to wait after the zero-based `attempt` failed.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let raw = self.base.as_secs_f64() * self.factor.powi(exponent);
        let capped = raw.min(self.cap.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}

/// What to do about a single failed attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryDecision {
    /// Try again after waiting on this curve.
    Retry(Backoff),
    /// Stop immediately and surface the error.
    Fatal,
}

/// Why the loop gave up.
#[derive(Debug)]
pub enum RetryFailure<E> {
    /// The classifier marked the error fatal.
    Fatal(E),
    /// Every attempt failed with a retryable error; `last` is the final one.
    Exhausted { attempts: u32, last: E },
}

impl<E> RetryFailure<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryFailure::Fatal(e) => e,
            RetryFailure::Exhausted { last, .. } => last,
        }
    }
}

/// Runs `op` up to `max_attempts` times (at least once).
///
/// `op` receives the zero-based attempt number. After a retryable failure the loop
/// sleeps for the classifier's backoff before the next attempt; no sleep follows
/// the final attempt.
pub async fn retry_with_backoff<T, E, F, Fut, C>(
    label: &str,
    max_attempts: u32,
    classify: C,
    mut op: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> RetryDecision,
    E: std::fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let error = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let backoff = match classify(&error) {
            RetryDecision::Fatal => return Err(RetryFailure::Fatal(error)),
            RetryDecision::Retry(backoff) => backoff,
        };

        if attempt + 1 >= max_attempts {
            warn!("{label}: giving up after {max_attempts} attempts: {error}");
            return Err(RetryFailure::Exhausted {
                attempts: max_attempts,
                last: error,
            });
        }

        let delay = backoff.delay(attempt);
        warn!(
            "{label}: attempt {} of {max_attempts} failed ({error}), retrying after {}ms",
            attempt + 1,
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
