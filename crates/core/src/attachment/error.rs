//! Attachment error types.

use thiserror::Error;

use crate::storage::StorageError;

/// A single file failed to upload.
#[derive(Debug, Error)]
#[error("failed to upload {file_name}: {source}")]
pub struct UploadError {
    /// Name of the file as selected.
    pub file_name: String,
    /// Underlying storage failure.
    #[source]
    pub source: StorageError,
}

impl UploadError {
    /// Create an upload error for a file.
    #[must_use]
    pub fn new(file_name: impl Into<String>, source: StorageError) -> Self {
        Self {
            file_name: file_name.into(),
            source,
        }
    }
}

/// A stored object could not be removed.
#[derive(Debug, Error)]
#[error("failed to delete {path}: {source}")]
pub struct DeleteError {
    /// Storage key of the object.
    pub path: String,
    /// Underlying storage failure.
    #[source]
    pub source: StorageError,
}

impl DeleteError {
    /// Create a delete error for a storage key.
    #[must_use]
    pub fn new(path: impl Into<String>, source: StorageError) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}
