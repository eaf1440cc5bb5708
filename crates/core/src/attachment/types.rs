//! Attachment types and data structures.

use bytes::Bytes;

use super::error::UploadError;
use crate::complaint::Attachment;

/// A file chosen for upload, held in memory until the complaint is posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    /// Original file name.
    pub name: String,
    /// MIME type reported for the file.
    pub content_type: String,
    /// File contents.
    pub bytes: Bytes,
}

impl PendingFile {
    /// Create a pending file.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the file is an image or audio clip.
    #[must_use]
    pub fn is_supported_media(&self) -> bool {
        let mime = self.content_type.to_ascii_lowercase();
        mime.starts_with("image/") || mime.starts_with("audio/")
    }
}

/// Files staged for the next submission.
///
/// Only images and audio are kept; anything else is dropped on `add`.
#[derive(Debug, Clone, Default)]
pub struct FileSelection {
    files: Vec<PendingFile>,
}

impl FileSelection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds files, skipping unsupported media. Returns how many were skipped.
    pub fn add(&mut self, files: impl IntoIterator<Item = PendingFile>) -> usize {
        let mut skipped = 0;
        for file in files {
            if file.is_supported_media() {
                self.files.push(file);
            } else {
                tracing::debug!(file = %file.name, content_type = %file.content_type, "Skipping unsupported file");
                skipped += 1;
            }
        }
        skipped
    }

    /// Removes the file at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<PendingFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    /// Drops every staged file.
    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Staged files in selection order.
    #[must_use]
    pub fn files(&self) -> &[PendingFile] {
        &self.files
    }

    /// Number of staged files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Empties the selection, returning its files.
    pub fn take(&mut self) -> Vec<PendingFile> {
        std::mem::take(&mut self.files)
    }
}

/// Outcome of uploading several files at once.
#[derive(Debug, Default)]
pub struct UploadBatch {
    /// Stored attachments, in input order.
    pub succeeded: Vec<Attachment>,
    /// Files that failed, in input order.
    pub failed: Vec<UploadError>,
}

impl UploadBatch {
    /// True when no file failed.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Storage keys of the uploads that did succeed.
    #[must_use]
    pub fn stored_paths(&self) -> Vec<String> {
        self.succeeded
            .iter()
            .filter_map(|a| a.path.clone())
            .collect()
    }
}
