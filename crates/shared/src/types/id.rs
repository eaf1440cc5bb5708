//! Opaque record identifiers.
//!
//! Ids are assigned by whichever backend stores the record, so they are kept as
//! strings rather than parsed into a fixed format.

use serde::{Deserialize, Serialize};

/// Unique identifier for a complaint within the active collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComplaintId(String);

impl ComplaintId {
    /// Wraps a backend-assigned id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ComplaintId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ComplaintId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ComplaintId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
