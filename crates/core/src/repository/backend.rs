//! Backend selected for a session.

use std::fmt;

use grievance_shared::types::ComplaintId;

use super::document::DocumentBackend;
use super::{
    ComplaintRepository, Listener, LocalBackend, RemoteBackend, RepositoryError, Subscription,
};
use crate::complaint::{ComplaintPatch, NewComplaint};

/// Which backend a repository talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// Remote document collection.
    Remote,
    /// In-memory list for this session only.
    Local,
}

impl BackendMode {
    /// Lowercase name for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The repository a session runs on. Chosen once at startup.
pub enum Backend<D: DocumentBackend> {
    /// Remote collection.
    Remote(RemoteBackend<D>),
    /// Local fallback.
    Local(LocalBackend),
}

impl<D: DocumentBackend> ComplaintRepository for Backend<D> {
    async fn create(&self, complaint: NewComplaint) -> Result<ComplaintId, RepositoryError> {
        match self {
            Self::Remote(repo) => repo.create(complaint).await,
            Self::Local(repo) => repo.create(complaint).await,
        }
    }

    async fn update(&self, id: &ComplaintId, patch: ComplaintPatch) -> Result<(), RepositoryError> {
        match self {
            Self::Remote(repo) => repo.update(id, patch).await,
            Self::Local(repo) => repo.update(id, patch).await,
        }
    }

    async fn delete(&self, id: &ComplaintId) -> Result<(), RepositoryError> {
        match self {
            Self::Remote(repo) => repo.delete(id).await,
            Self::Local(repo) => repo.delete(id).await,
        }
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        match self {
            Self::Remote(repo) => repo.subscribe(listener),
            Self::Local(repo) => repo.subscribe(listener),
        }
    }

    fn mode(&self) -> BackendMode {
        match self {
            Self::Remote(_) => BackendMode::Remote,
            Self::Local(_) => BackendMode::Local,
        }
    }
}
