//! Complaint lifecycle orchestration.

use std::sync::Arc;

use grievance_shared::types::{ComplaintId, NoticeLevel};

use super::error::{DeleteError, DeleteOutcome, SubmitError, UpdateError};
use crate::attachment::{AttachmentStore, PendingFile};
use crate::complaint::{ComplaintForm, ComplaintPatch};
use crate::notify::{Confirm, Notifier};
use crate::repository::ComplaintRepository;
use crate::sync::ComplaintSet;

pub(crate) const FILL_REQUIRED: &str = "Please fill in all required fields";
pub(crate) const UPLOADING_COMPLAINT: &str = "Uploading complaint...";
pub(crate) const UPLOADING_FILES: &str = "Uploading files...";
pub(crate) const FILES_UPLOADED: &str = "Files uploaded successfully!";
pub(crate) const SOME_UPLOADS_FAILED: &str =
    "Some files failed to upload. Posting complaint without attachments.";
pub(crate) const NO_STORAGE: &str = "File storage not available. Files will not be uploaded.";
pub(crate) const POSTED: &str = "Complaint posted successfully!";
pub(crate) const POST_FAILED: &str = "Error posting complaint. Please try again.";
pub(crate) const RESOLVED: &str = "Complaint resolved!";
pub(crate) const UNRESOLVED: &str = "Complaint marked as unresolved!";
pub(crate) const UPDATE_FAILED: &str = "Error updating complaint. Please try again.";
pub(crate) const DELETE_PROMPT: &str = "Are you sure you want to delete this complaint?";
pub(crate) const DELETED: &str = "Complaint deleted successfully!";
pub(crate) const DELETE_FAILED: &str = "Error deleting complaint. Please try again.";

/// Coordinates attachment storage and the repository for each user action.
pub struct ComplaintLifecycle<R: ComplaintRepository> {
    repository: Arc<R>,
    attachments: Option<AttachmentStore>,
    complaints: Arc<ComplaintSet>,
    notifier: Arc<dyn Notifier>,
    attachment_scope: String,
}

impl<R: ComplaintRepository> ComplaintLifecycle<R> {
    /// Create a lifecycle service.
    ///
    /// `complaints` is the controller's list, used to read current state.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        attachments: Option<AttachmentStore>,
        complaints: Arc<ComplaintSet>,
        notifier: Arc<dyn Notifier>,
        attachment_scope: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            attachments,
            complaints,
            notifier,
            attachment_scope: attachment_scope.into(),
        }
    }

    /// Whether files can be attached.
    #[must_use]
    pub fn attachments_enabled(&self) -> bool {
        self.attachments.is_some()
    }

    fn notify(&self, message: &str, level: NoticeLevel) {
        self.notifier.notify(message, level);
    }

    /// Validates the form, uploads `files` and stores the complaint.
    ///
    /// If any file fails, none are attached and the complaint is still posted.
    ///
    /// # Errors
    ///
    /// Returns an error if the form is invalid or the record cannot be created.
    pub async fn submit(
        &self,
        form: &ComplaintForm,
        files: Vec<PendingFile>,
    ) -> Result<ComplaintId, SubmitError> {
        let complaint = match form.validate() {
            Ok(complaint) => complaint,
            Err(err) => {
                tracing::debug!(error = %err, "Complaint form rejected");
                self.notify(FILL_REQUIRED, NoticeLevel::Warning);
                return Err(SubmitError::Validation(err));
            }
        };

        self.notify(UPLOADING_COMPLAINT, NoticeLevel::Info);

        let mut attachments = Vec::new();
        if !files.is_empty() {
            match &self.attachments {
                Some(store) => {
                    self.notify(UPLOADING_FILES, NoticeLevel::Info);
                    let batch = store.upload_all(&files, &self.attachment_scope).await;

                    if batch.all_succeeded() {
                        self.notify(FILES_UPLOADED, NoticeLevel::Success);
                        attachments = batch.succeeded;
                    } else {
                        for failure in &batch.failed {
                            self.notify(
                                &format!("Failed to upload {}: {}", failure.file_name, failure.source),
                                NoticeLevel::Error,
                            );
                        }
                        self.notify(SOME_UPLOADS_FAILED, NoticeLevel::Warning);

                        for failure in store.delete_all(&batch.stored_paths()).await {
                            tracing::warn!(path = %failure.path, error = %failure.source, "Could not remove discarded upload");
                        }
                    }
                }
                None => self.notify(NO_STORAGE, NoticeLevel::Warning),
            }
        }

        let stored_paths: Vec<String> = attachments
            .iter()
            .filter_map(|a| a.path.clone())
            .collect();

        match self
            .repository
            .create(complaint.with_attachments(attachments))
            .await
        {
            Ok(id) => {
                self.notify(POSTED, NoticeLevel::Success);
                Ok(id)
            }
            Err(err) => {
                tracing::error!(error = %err, orphaned = ?stored_paths, "Failed to create complaint");
                self.notify(POST_FAILED, NoticeLevel::Error);
                Err(SubmitError::Create(err))
            }
        }
    }

    /// Flips the resolved flag. Returns the new value.
    ///
    /// # Errors
    ///
    /// Returns an error if the complaint is unknown or the update fails.
    pub async fn toggle_resolved(&self, id: &ComplaintId) -> Result<bool, UpdateError> {
        let Some(current) = self.complaints.find(id) else {
            tracing::warn!(id = %id, "Cannot toggle unknown complaint");
            self.notify(UPDATE_FAILED, NoticeLevel::Error);
            return Err(UpdateError::NotFound(id.clone()));
        };

        let resolved = !current.resolved;
        match self
            .repository
            .update(id, ComplaintPatch::resolved(resolved))
            .await
        {
            Ok(()) => {
                let message = if resolved { RESOLVED } else { UNRESOLVED };
                self.notify(message, NoticeLevel::Success);
                Ok(resolved)
            }
            Err(err) => {
                tracing::error!(id = %id, error = %err, "Failed to update complaint");
                self.notify(UPDATE_FAILED, NoticeLevel::Error);
                Err(err.into())
            }
        }
    }

    /// Deletes a complaint and its attachments after confirmation.
    ///
    /// Attachment failures are logged and never block the record delete.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be deleted.
    pub async fn delete(
        &self,
        id: &ComplaintId,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome, DeleteError> {
        if !confirm.confirm(DELETE_PROMPT) {
            return Ok(DeleteOutcome::Cancelled);
        }

        let paths = self
            .complaints
            .find(id)
            .map(|complaint| complaint.attachment_paths())
            .unwrap_or_default();

        if !paths.is_empty() {
            match &self.attachments {
                Some(store) => {
                    for failure in store.delete_all(&paths).await {
                        tracing::warn!(id = %id, path = %failure.path, error = %failure.source, "Failed to delete attachment");
                    }
                }
                None => {
                    tracing::warn!(id = %id, count = paths.len(), "No file storage; attachments left in place");
                }
            }
        }

        match self.repository.delete(id).await {
            Ok(()) => {
                self.notify(DELETED, NoticeLevel::Success);
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) => {
                tracing::error!(id = %id, error = %err, "Failed to delete complaint");
                self.notify(DELETE_FAILED, NoticeLevel::Error);
                Err(err.into())
            }
        }
    }
}
