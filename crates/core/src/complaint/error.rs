//! Complaint validation errors.

use thiserror::Error;

/// Form validation failures. Raised before any backend is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is empty after trimming.
    #[error("{field} is required")]
    MissingField {
        /// Document name of the field.
        field: &'static str,
    },

    /// The floor number is not an integer.
    #[error("floor number must be a whole number, got '{value}'")]
    InvalidFloor {
        /// The rejected input.
        value: String,
    },
}

impl ValidationError {
    /// Create a missing field error.
    #[must_use]
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Create an invalid floor error.
    #[must_use]
    pub fn invalid_floor(value: impl Into<String>) -> Self {
        Self::InvalidFloor {
            value: value.into(),
        }
    }
}
