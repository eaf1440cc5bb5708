//! Realtime document database collaborator.

use std::future::Future;

use futures::stream::BoxStream;
use serde_json::{Map, Value};
use thiserror::Error;

/// Top-level fields of a stored document.
pub type DocumentFields = Map<String, Value>;

/// Full ordered snapshots of a collection, one item per change.
pub type SnapshotStream = BoxStream<'static, Result<Vec<DocumentRecord>, DocumentError>>;

/// A stored document and its backend-assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    /// Backend id.
    pub id: String,
    /// Document body.
    pub fields: DocumentFields,
}

/// Snapshot sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Document backend failures.
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    /// The backend could not be reached.
    #[error("document backend unavailable: {0}")]
    Unavailable(String),

    /// No document with this id exists in the collection.
    #[error("document {id} not found in {collection}")]
    NotFound {
        /// Collection searched.
        collection: String,
        /// Missing id.
        id: String,
    },

    /// The backend rejected or failed the operation.
    #[error("document operation failed: {0}")]
    Operation(String),
}

impl DocumentError {
    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }
}

/// A document collection store that pushes snapshots on change.
///
/// Implemented by the db crate.
pub trait DocumentBackend: Send + Sync + 'static {
    /// Inserts a document and returns its generated id.
    ///
    /// `server_timestamp_field` is set to the backend's current time.
    fn create_record(
        &self,
        collection: &str,
        fields: DocumentFields,
        server_timestamp_field: &str,
    ) -> impl Future<Output = Result<String, DocumentError>> + Send;

    /// Merges `patch` into the top-level fields of a document.
    fn update_record(
        &self,
        collection: &str,
        id: &str,
        patch: DocumentFields,
    ) -> impl Future<Output = Result<(), DocumentError>> + Send;

    /// Deletes a document. Deleting a missing document succeeds.
    fn delete_record(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<(), DocumentError>> + Send;

    /// Streams the whole collection, sorted by `order_field`: once immediately,
    /// then after every change.
    fn subscribe(
        &self,
        collection: &str,
        order_field: &str,
        direction: Direction,
    ) -> impl Future<Output = Result<SnapshotStream, DocumentError>> + Send;

    /// Checks that the backend is reachable.
    fn ping(&self) -> impl Future<Output = Result<(), DocumentError>> + Send;
}
