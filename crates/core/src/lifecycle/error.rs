//! Lifecycle error types.

use grievance_shared::types::ComplaintId;
use thiserror::Error;

use crate::complaint::ValidationError;
use crate::repository::RepositoryError;

/// Submitting a complaint failed.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The form is incomplete. Nothing was uploaded or stored.
    #[error("invalid complaint: {0}")]
    Validation(#[from] ValidationError),

    /// The record could not be created.
    #[error("failed to create complaint: {0}")]
    Create(#[source] RepositoryError),
}

/// Toggling the resolved flag failed.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The complaint is not in the current list.
    #[error("complaint not found: {0}")]
    NotFound(ComplaintId),

    /// The repository refused the update.
    #[error("failed to update complaint: {0}")]
    Repository(#[from] RepositoryError),
}

/// Deleting a complaint record failed.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// The repository refused the delete.
    #[error("failed to delete complaint: {0}")]
    Repository(#[from] RepositoryError),
}

/// What a delete request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record is gone.
    Deleted,
    /// The user declined; nothing was touched.
    Cancelled,
}
