//! Cancellation and deadline handling for outbound calls

use crate::error::{OAuthError, OAuthResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Per-call context carried into every network operation
///
/// Cloning shares the cancellation token, so cancelling any clone aborts
/// every call running under it.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<(Instant, Duration)>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().timeout(timeout)
    }

    /// Bind to an existing cancellation token (e.g., a request-scoped one)
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some((Instant::now() + timeout, timeout));
        self
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Drive `fut` to completion unless the context is cancelled or expires first
    ///
    /// The losing future is dropped, which aborts any in-flight request.
    pub async fn run<T, F>(&self, operation: &'static str, fut: F) -> OAuthResult<T>
    where
        F: Future<Output = OAuthResult<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(OAuthError::Cancelled { operation });
        }

        match self.deadline {
            Some((deadline, after)) => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Err(OAuthError::Cancelled { operation }),
                    _ = tokio::time::sleep_until(deadline) => {
                        Err(OAuthError::Timeout { operation, after })
                    }
                    result = fut => result,
                }
            }
            None => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Err(OAuthError::Cancelled { operation }),
                    result = fut => result,
                }
            }
        }
    }
}
