//! Per-call cancellation and deadlines.
//!
//! Every login call carries a [`CallContext`]. Whoever issued the call can
//! cancel it through the shared [`CancellationToken`], or bound it with a
//! deadline. Code doing work on behalf of the call wraps each await point
//! in [`CallContext::run`], so an abandoned call stops promptly instead of
//! finishing work nobody will read.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a call stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The caller cancelled the call.
    #[error("call cancelled")]
    Cancelled,

    /// The call's deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation token plus optional deadline for one call.
///
/// Clones share the same token: cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context with no deadline that is only cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline_at(Instant::now() + timeout)
    }

    /// Returns this context with its deadline set to `deadline`.
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns this context driven by an externally owned token, e.g. a
    /// server's shutdown token.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The token that cancels this call.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancels the call (and every clone of this context).
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` when there is no deadline;
    /// `Some(Duration::ZERO)` once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fails if the call has been cancelled or its deadline has passed.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.cancel.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(ContextError::DeadlineExceeded)
            }
            _ => Ok(()),
        }
    }

    /// Drives `fut` to completion unless the call is cancelled or times out
    /// first, in which case `fut` is dropped.
    pub async fn run<F: Future>(
        &self,
        fut: F,
    ) -> Result<F::Output, ContextError> {
        self.check()?;
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(ContextError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => {
                    Err(ContextError::DeadlineExceeded)
                }
                out = fut => Ok(out),
            },
            None => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(ContextError::Cancelled),
                out = fut => Ok(out),
            },
        }
    }
}
