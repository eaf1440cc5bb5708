//! Errors raised by the attachment object store.

use thiserror::Error;

/// Object store failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Attachment is over the configured size limit.
    #[error("{size} bytes is over the {max} byte attachment limit")]
    TooLarge {
        /// Attachment size.
        size: u64,
        /// Configured limit.
        max: u64,
    },

    /// Attachment type is not on the allow-list.
    #[error("'{content_type}' files cannot be attached")]
    UnsupportedType {
        /// Rejected MIME type.
        content_type: String,
    },

    /// No object at the key.
    #[error("no stored object: {0}")]
    Missing(String),

    /// The session has no object store.
    #[error("file storage not initialized")]
    Disabled,

    /// Store could not be reached or refused the readiness check.
    #[error("file storage unreachable: {0}")]
    Unavailable(String),

    /// Provider settings could not build an operator.
    #[error("invalid storage settings: {0}")]
    Configuration(String),

    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub(crate) fn too_large(size: u64, max: u64) -> Self {
        Self::TooLarge { size, max }
    }

    pub(crate) fn unsupported_type(content_type: impl Into<String>) -> Self {
        Self::UnsupportedType {
            content_type: content_type.into(),
        }
    }

    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether the failure came from validation rather than the backend.
    #[must_use]
    pub fn is_rejected_upload(&self) -> bool {
        matches!(self, Self::TooLarge { .. } | Self::UnsupportedType { .. })
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::Missing(err.to_string()),
            opendal::ErrorKind::PermissionDenied | opendal::ErrorKind::ConfigInvalid => {
                Self::Unavailable(err.to_string())
            }
            _ => Self::Backend(err.to_string()),
        }
    }
}
