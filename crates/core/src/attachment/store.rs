//! Attachment store on top of the storage service.

use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use uuid::Uuid;

use super::error::{DeleteError, UploadError};
use super::types::{PendingFile, UploadBatch};
use crate::complaint::Attachment;
use crate::storage::{StorageError, StorageService};

/// Uploads and removes complaint attachments.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    storage: Arc<StorageService>,
}

impl AttachmentStore {
    /// Create a store over a storage service.
    #[must_use]
    pub fn new(storage: StorageService) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    /// The underlying storage service.
    #[must_use]
    pub fn storage(&self) -> &StorageService {
        &self.storage
    }

    /// Uploads one file under `scope` and returns its attachment record.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is rejected or the write fails.
    pub async fn upload(&self, file: &PendingFile, scope: &str) -> Result<Attachment, UploadError> {
        let fail = |source| UploadError::new(&file.name, source);

        self.storage
            .validate_upload(&file.content_type, file.size())
            .map_err(fail)?;

        let path = StorageService::generate_storage_key(scope, &file.name);
        self.storage
            .write(&path, file.bytes.clone())
            .await
            .map_err(fail)?;
        let url = self.storage.public_url(&path).await.map_err(fail)?;

        tracing::debug!(file = %file.name, path = %path, "Attachment uploaded");

        Ok(Attachment {
            name: file.name.clone(),
            content_type: file.content_type.clone(),
            size: file.size(),
            url,
            path: Some(path),
        })
    }

    /// Uploads every file concurrently and waits for all of them to settle.
    pub async fn upload_all(&self, files: &[PendingFile], scope: &str) -> UploadBatch {
        let results = join_all(files.iter().map(|file| self.upload(file, scope))).await;

        let mut batch = UploadBatch::default();
        for result in results {
            match result {
                Ok(attachment) => batch.succeeded.push(attachment),
                Err(err) if err.source.is_rejected_upload() => {
                    tracing::info!(file = %err.file_name, reason = %err.source, "Attachment rejected");
                    batch.failed.push(err);
                }
                Err(err) => {
                    tracing::warn!(file = %err.file_name, error = %err.source, "Attachment upload failed");
                    batch.failed.push(err);
                }
            }
        }
        batch
    }

    /// Removes one stored object.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the delete.
    pub async fn delete(&self, path: &str) -> Result<(), DeleteError> {
        self.storage
            .delete(path)
            .await
            .map_err(|source| DeleteError::new(path, source))
    }

    /// Removes every object concurrently. Returns the failures; never stops early.
    pub async fn delete_all(&self, paths: &[String]) -> Vec<DeleteError> {
        join_all(paths.iter().map(|path| self.delete(path)))
            .await
            .into_iter()
            .filter_map(Result::err)
            .collect()
    }

    /// Writes, resolves and removes a throwaway object. Returns its URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or URL lookup fails.
    pub async fn probe(&self) -> Result<String, StorageError> {
        let path = format!("test/{}_test.txt", Uuid::new_v4());
        self.storage
            .write(&path, Bytes::from_static(b"Test file"))
            .await?;
        let url = self.storage.public_url(&path).await?;

        if let Err(err) = self.storage.delete(&path).await {
            tracing::warn!(path = %path, error = %err, "Could not remove storage probe object");
        }

        Ok(url)
    }
}
