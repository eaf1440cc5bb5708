//! The complaint list shown to the user.

use std::sync::{PoisonError, RwLock};

use grievance_shared::types::ComplaintId;

use crate::complaint::Complaint;

/// Latest snapshot received from the repository, newest first.
#[derive(Debug, Default)]
pub struct ComplaintSet {
    complaints: RwLock<Vec<Complaint>>,
}

impl ComplaintSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the current list.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Complaint> {
        self.complaints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Looks a complaint up by id.
    #[must_use]
    pub fn find(&self, id: &ComplaintId) -> Option<Complaint> {
        self.complaints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| &c.id == id)
            .cloned()
    }

    /// Number of complaints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.complaints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn replace(&self, complaints: Vec<Complaint>) {
        *self
            .complaints
            .write()
            .unwrap_or_else(PoisonError::into_inner) = complaints;
    }
}
