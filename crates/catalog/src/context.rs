//! Per-call cancellation and deadline state.

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why a call stopped before finishing its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The caller cancelled the request
    #[error("request is canceled")]
    Canceled,
    /// The caller's deadline passed
    #[error("deadline is exceeded")]
    DeadlineExceeded,
}

/// Cancellation signal and optional deadline for one call.
///
/// Cloning is cheap and every clone observes the same cancellation, so the
/// transport can keep one handle to cancel while the work holds another.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context with no deadline that is only done once cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Make this context a child of `parent`: cancelling `parent` cancels it,
    /// cancelling it leaves `parent` alone.
    ///
    /// Replaces the context's token, so link before handing out clones.
    pub fn linked_to(mut self, parent: &CancellationToken) -> Self {
        self.token = parent.child_token();
        self
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel the call. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token that is cancelled together with this context.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// The reason the call is done, or `None` while it may proceed.
    ///
    /// Cancellation wins over an expired deadline.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// `Err` with the reason once the call is done.
    pub fn check(&self) -> Result<(), ContextError> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Wait until the call is cancelled or its deadline passes.
    ///
    /// Never resolves for a context without a deadline that nobody cancels.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => ContextError::Canceled,
                    _ = tokio::time::sleep_until(deadline.into()) => ContextError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                ContextError::Canceled
            }
        }
    }
}
