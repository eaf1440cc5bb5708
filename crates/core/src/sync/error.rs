//! Sync error types.

use thiserror::Error;

/// Sync controller errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// `start` was called while a subscription is live.
    #[error("sync controller is already started")]
    AlreadyStarted,
}
