//! Cancellation and deadline propagation for remote calls.
//!
//! Every operation that talks to the Hetzner Cloud API takes a [`Context`].
//! Retry loops and the action poller check it between attempts so a cancelled
//! or expired request stops promptly instead of spending its whole budget.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`Context`] is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The request was cancelled by the caller.
    #[error("context cancelled")]
    Cancelled,
    /// The request deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation token plus an optional deadline.
///
/// Cloning a context shares the token, so cancelling any clone cancels all of
/// them.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Wrap an existing cancellation token.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            deadline: None,
        }
    }

    /// Derive a context that expires after `timeout`.
    ///
    /// An earlier deadline already present on `self` wins.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(match self.deadline {
                Some(existing) if existing < deadline => existing,
                _ => deadline,
            }),
        }
    }

    /// The token backing this context.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The deadline, if one is set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the reason the context is done, or `Ok(())` if it is still live.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.cancel.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ContextError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Sleep for `duration`, waking early if the context is done.
    pub async fn sleep(&self, duration: Duration) -> Result<(), ContextError> {
        let wake = Instant::now() + duration;
        let (until, at_deadline) = match self.deadline {
            Some(deadline) if deadline <= wake => (deadline, true),
            _ => (wake, false),
        };

        tokio::select! {
            _ = self.cancel.cancelled() => Err(ContextError::Cancelled),
            _ = tokio::time::sleep_until(until) => {
                if at_deadline {
                    Err(ContextError::DeadlineExceeded)
                } else {
                    Ok(())
                }
            }
        }
    }
}
