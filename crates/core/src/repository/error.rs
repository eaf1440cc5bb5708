//! Repository error types.

use grievance_shared::types::ComplaintId;
use thiserror::Error;

use super::document::DocumentError;

/// Complaint repository errors.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// No complaint with this id.
    #[error("complaint not found: {0}")]
    NotFound(ComplaintId),

    /// The document backend failed.
    #[error("document backend error: {0}")]
    Document(#[from] DocumentError),

    /// A complaint could not be turned into a document.
    #[error("failed to encode complaint: {0}")]
    Encode(String),
}

impl RepositoryError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(id: ComplaintId) -> Self {
        Self::NotFound(id)
    }
}
