//! Cancellation and deadlines for a single execution.

use maestro_core::Error as CoreError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout_at};
use tokio_util::sync::CancellationToken;

/// Cancellation token and optional deadline handed to every agent call.
///
/// Agents wrap backend calls in [`ExecutionContext::guard`] so that
/// cancellation and deadlines reach in-flight requests.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Cancelled by the caller to stop all work
    cancel: CancellationToken,
    /// Instant after which calls fail with a timeout
    deadline: Option<Instant>,
}

impl ExecutionContext {
    /// Creates a context with a fresh token and no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context driven by an existing token.
    #[must_use]
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Returns a copy whose deadline is at most `limit` from now.
    ///
    /// A limit too large to represent as an instant leaves the current
    /// deadline in place.
    #[must_use]
    pub fn with_timeout(&self, limit: Duration) -> Self {
        let Some(candidate) = Instant::now().checked_add(limit) else {
            return self.clone();
        };
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(self.deadline.map_or(candidate, |current| current.min(candidate))),
        }
    }

    /// The underlying token.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancels this context and every copy of it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Time left before the deadline, if one is set.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Runs `operation` until it finishes, the deadline passes or the
    /// context is cancelled.
    ///
    /// # Errors
    /// Returns the operation's own error, or a core `Timeout`/`Cancelled`
    /// error converted into `E`.
    pub async fn guard<T, E, F>(&self, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<CoreError>,
    {
        let bounded = async {
            match self.deadline {
                Some(deadline) => {
                    let budget_ms = self.remaining().unwrap_or_default().as_millis() as u64;
                    match timeout_at(deadline, operation).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(E::from(CoreError::Timeout(budget_ms))),
                    }
                }
                None => operation.await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(E::from(CoreError::Cancelled)),
            outcome = bounded => outcome,
        }
    }

    /// Sleeps for `pause` unless cancelled first.
    ///
    /// Returns `false` if the sleep was interrupted by cancellation.
    pub async fn pause(&self, pause: Duration) -> bool {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            () = sleep(pause) => true,
        }
    }
}
