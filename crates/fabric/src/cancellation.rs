//! Cooperative cancellation for renders.
//!
//! A [`Cancellation`] combines a shared token, which any thread may trip, with
//! an optional deadline. The assembler polls it before visiting every node.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// A cancellation token with an optional deadline.
///
/// Clones share the token but each carries its own deadline.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    inner: CancellationToken,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// Create a new cancellation token without a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy that also trips once `timeout` has elapsed from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    /// Check if cancellation has been requested or the deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
            || self
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Request cancellation.
    ///
    /// After this is called, `is_cancelled()` will return `true` for this
    /// token and every clone of it.
    pub fn cancel(&self) {
        self.inner.cancel();
    }
}

impl From<CancellationToken> for Cancellation {
    fn from(token: CancellationToken) -> Self {
        Self {
            inner: token,
            deadline: None,
        }
    }
}
