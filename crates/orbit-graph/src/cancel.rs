//! Cooperative cancellation for long-running metric passes.
//!
//! A [`CancelToken`] is a cloneable handle around a shared atomic flag.
//! Algorithms call [`CancelToken::check`] at their checkpoints (after each
//! Brandes source pass, each PageRank iteration, each modularity pass) and
//! bail out with [`GraphError::Cancelled`] once the flag is set. Nothing
//! partial escapes: the error replaces the whole result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{GraphError, Result, Stage};

/// Shared cancellation flag.
///
/// Cloning the token shares the flag, so one clone can be handed to a
/// worker thread while the caller keeps another to call [`cancel`](Self::cancel).
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Fail with [`GraphError::Cancelled`] if cancellation was requested.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cancelled`] tagged with `stage` when the flag is set.
    pub fn check(&self, stage: Stage) -> Result<()> {
        if self.is_cancelled() {
            tracing::debug!(%stage, "cancellation observed");
            return Err(GraphError::Cancelled { stage });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_passes_checks() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check(Stage::PageRank).is_ok());
    }

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let worker_side = token.clone();
        token.cancel();
        assert!(worker_side.is_cancelled());
        assert_eq!(
            worker_side.check(Stage::Betweenness),
            Err(GraphError::Cancelled {
                stage: Stage::Betweenness
            })
        );
    }

    #[test]
    fn cancel_is_idempotent() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }
}
