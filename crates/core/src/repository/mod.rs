//! Complaint persistence with a remote and a local backend.
//!
//! - `document` - Collaborator trait for a realtime document database
//! - `remote` - Repository over a document collection
//! - `local` - In-memory fallback repository
//! - `backend` - The backend chosen for a session
//! - `subscription` - Cancellable push subscriptions

mod backend;
mod document;
mod error;
mod local;
mod remote;
mod subscription;

#[cfg(test)]
pub(crate) mod fake;

use std::future::Future;
use std::sync::Arc;

use grievance_shared::types::ComplaintId;

use crate::complaint::{Complaint, ComplaintPatch, NewComplaint};

pub use backend::{Backend, BackendMode};
pub use document::{
    DocumentBackend, DocumentError, DocumentFields, DocumentRecord, Direction, SnapshotStream,
};
pub use error::RepositoryError;
pub use local::LocalBackend;
pub use remote::RemoteBackend;
pub use subscription::Subscription;

/// Callback receiving every full snapshot of the collection, newest first.
pub type Listener = Arc<dyn Fn(Result<Vec<Complaint>, RepositoryError>) + Send + Sync>;

/// Uniform complaint storage over either backend.
pub trait ComplaintRepository: Send + Sync {
    /// Stores a new complaint. The backend assigns id and timestamp.
    fn create(
        &self,
        complaint: NewComplaint,
    ) -> impl Future<Output = Result<ComplaintId, RepositoryError>> + Send;

    /// Applies a partial update.
    fn update(
        &self,
        id: &ComplaintId,
        patch: ComplaintPatch,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Removes a complaint record.
    fn delete(&self, id: &ComplaintId) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Registers a listener for collection snapshots.
    ///
    /// Must be called from within a Tokio runtime.
    fn subscribe(&self, listener: Listener) -> Subscription;

    /// Which backend serves this repository.
    fn mode(&self) -> BackendMode;
}
