//! Bounded retry with exponential backoff and jitter.
//!
//! Each attempt classifies its own failure: [`RetryError::Retry`] asks for
//! another attempt, [`RetryError::Abort`] ends the loop immediately and
//! surfaces the error as-is. The [`Context`] is checked before every attempt
//! and while backing off, so cancellation stops the loop without spending the
//! remaining budget.
//!
//! # Example
//!
//! ```ignore
//! use hcloud_network_provider::retry::{retry, RetryError, RetryPolicy};
//!
//! let action = retry(&ctx, &RetryPolicy::default(), "add_subnet", || async {
//!     client.add_subnet(&ctx, network_id, opts.clone()).await.map_err(|err| {
//!         if err.is(&ErrorCode::Conflict) {
//!             RetryError::Retry(err.into())
//!         } else {
//!             RetryError::Abort(err.into())
//!         }
//!     })
//! })
//! .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, error, warn};

use crate::context::{Context, ContextError};

/// Attempt budget used for subnet creation.
pub const DEFAULT_RETRIES: u32 = 5;

/// How often and how patiently to retry.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero still makes one attempt.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for the delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRIES,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// The default policy with a different attempt budget.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// The same policy with the attempt budget multiplied by `factor`.
    pub fn scaled(&self, factor: u32) -> Self {
        Self {
            max_attempts: self.max_attempts.saturating_mul(factor),
            ..self.clone()
        }
    }

    /// Base delay (without jitter) before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(retry.min(i32::MAX as u32) as i32);
        let secs = (self.initial_delay.as_secs_f64() * factor).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// Outcome of a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Transient failure, try again while budget remains.
    Retry(E),
    /// Permanent failure, stop now.
    Abort(E),
}

impl<E> RetryError<E> {
    /// The wrapped error.
    pub fn into_inner(self) -> E {
        match self {
            Self::Retry(err) | Self::Abort(err) => err,
        }
    }
}

/// Run `operation` until it succeeds, aborts, or `policy.max_attempts`
/// attempts have been made.
///
/// Returns the last error once the budget is exhausted. A done context
/// surfaces as the context error converted into `E`.
pub async fn retry<F, Fut, T, E>(
    ctx: &Context,
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
    E: std::fmt::Display + From<ContextError>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0u32;

    loop {
        ctx.check()?;

        let err = match operation().await {
            Ok(result) => return Ok(result),
            Err(RetryError::Abort(err)) => {
                debug!(operation = %operation_name, error = %err, "Operation aborted");
                return Err(err);
            }
            Err(RetryError::Retry(err)) => err,
        };
        attempts += 1;

        if attempts >= max_attempts {
            error!(
                operation = %operation_name,
                attempts,
                error = %err,
                "Operation failed after max attempts"
            );
            return Err(err);
        }

        // Jitter: 0.5x to 1.5x of the delay
        let jitter = rand::thread_rng().gen_range(0.5..1.5);
        let delay = Duration::from_secs_f64(policy.delay_for(attempts - 1).as_secs_f64() * jitter);

        warn!(
            operation = %operation_name,
            attempt = attempts,
            error = %err,
            delay_ms = delay.as_millis() as u64,
            "Operation failed, retrying"
        );

        ctx.sleep(delay).await?;
    }
}
