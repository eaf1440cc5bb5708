//! Session wiring: backend selection, storage readiness and teardown.

use std::sync::Arc;
use std::time::Duration;

use grievance_shared::config::BoardConfig;
use grievance_shared::types::{ComplaintId, NoticeLevel};

use crate::attachment::{AttachmentStore, PendingFile};
use crate::complaint::{Complaint, ComplaintForm};
use crate::lifecycle::{ComplaintLifecycle, DeleteError, DeleteOutcome, SubmitError, UpdateError};
use crate::notify::{Confirm, Notifier, Renderer};
use crate::repository::{
    Backend, BackendMode, ComplaintRepository, DocumentBackend, LocalBackend, RemoteBackend,
};
use crate::storage::{StorageError, StorageService};
use crate::sync::{SyncController, SyncError};

const CONNECTED: &str = "Connected to remote backend!";
const FALLBACK: &str = "Remote backend unavailable. Running in local mode.";
const STORAGE_DISABLED: &str = "File storage not enabled. File uploads disabled.";
const TESTING_STORAGE: &str = "Testing file storage...";
const STORAGE_OK: &str = "File storage test successful!";
const STORAGE_MISSING: &str = "File storage not initialized!";

/// Session parameters.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Document collection holding complaints.
    pub collection: String,
    /// Key prefix for attachment objects.
    pub attachment_scope: String,
    /// How long remote services get to report ready.
    pub startup_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&BoardConfig::default())
    }
}

impl From<&BoardConfig> for SessionSettings {
    fn from(config: &BoardConfig) -> Self {
        Self {
            collection: config.collection.clone(),
            attachment_scope: config.attachment_scope.clone(),
            startup_timeout: Duration::from_millis(config.startup_timeout_ms),
        }
    }
}

/// A running complaint board.
pub struct Session<D: DocumentBackend> {
    sync: SyncController,
    lifecycle: ComplaintLifecycle<Backend<D>>,
    attachments: Option<AttachmentStore>,
    notifier: Arc<dyn Notifier>,
    mode: BackendMode,
}

impl<D: DocumentBackend> Session<D> {
    /// Picks the backend, checks storage and starts syncing.
    ///
    /// Remote mode needs `remote` to answer a ping within the startup timeout.
    /// Storage is only used in remote mode, and only if it passes its check.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync controller cannot start.
    pub async fn open(
        remote: Option<D>,
        storage: Option<StorageService>,
        settings: SessionSettings,
        renderer: Arc<dyn Renderer>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, SyncError> {
        let backend = Self::select_backend(remote, &settings, notifier.as_ref()).await;
        let mode = backend.mode();

        let attachments = match (mode, storage) {
            (BackendMode::Remote, Some(storage)) => {
                match tokio::time::timeout(settings.startup_timeout, storage.check()).await {
                    Ok(Ok(())) => {
                        tracing::info!(provider = storage.provider_name(), bucket = storage.bucket(), "File storage ready");
                        Some(AttachmentStore::new(storage))
                    }
                    Ok(Err(err)) => {
                        tracing::error!(provider = storage.provider_name(), error = %err, "File storage check failed");
                        notifier.notify(STORAGE_DISABLED, NoticeLevel::Error);
                        None
                    }
                    Err(_) => {
                        tracing::error!(provider = storage.provider_name(), "File storage check timed out");
                        notifier.notify(STORAGE_DISABLED, NoticeLevel::Error);
                        None
                    }
                }
            }
            (BackendMode::Local, Some(storage)) => {
                tracing::info!(provider = storage.provider_name(), "Local mode; file storage unused");
                None
            }
            (_, None) => None,
        };

        let repository = Arc::new(backend);
        let sync = SyncController::new(renderer, Arc::clone(&notifier));
        sync.start(repository.as_ref())?;

        let lifecycle = ComplaintLifecycle::new(
            repository,
            attachments.clone(),
            sync.view(),
            Arc::clone(&notifier),
            settings.attachment_scope,
        );

        tracing::info!(mode = %mode, attachments = attachments.is_some(), "Session opened");

        Ok(Self {
            sync,
            lifecycle,
            attachments,
            notifier,
            mode,
        })
    }

    async fn select_backend(
        remote: Option<D>,
        settings: &SessionSettings,
        notifier: &dyn Notifier,
    ) -> Backend<D> {
        let Some(documents) = remote else {
            tracing::info!("No remote backend configured, running in local mode");
            return Backend::Local(LocalBackend::new());
        };

        match tokio::time::timeout(settings.startup_timeout, documents.ping()).await {
            Ok(Ok(())) => {
                notifier.notify(CONNECTED, NoticeLevel::Success);
                Backend::Remote(RemoteBackend::new(documents, settings.collection.clone()))
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "Remote backend unreachable");
                notifier.notify(FALLBACK, NoticeLevel::Error);
                Backend::Local(LocalBackend::new())
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = settings.startup_timeout.as_millis(),
                    "Remote backend did not answer in time"
                );
                notifier.notify(FALLBACK, NoticeLevel::Error);
                Backend::Local(LocalBackend::new())
            }
        }
    }

    /// Backend serving this session.
    #[must_use]
    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    /// Whether files can be attached.
    #[must_use]
    pub fn attachments_enabled(&self) -> bool {
        self.attachments.is_some()
    }

    /// Current complaint list, newest first.
    #[must_use]
    pub fn complaints(&self) -> Vec<Complaint> {
        self.sync.complaints()
    }

    /// Looks a complaint up in the current list.
    #[must_use]
    pub fn find(&self, id: &ComplaintId) -> Option<Complaint> {
        self.sync.find(id)
    }

    /// Posts a complaint.
    ///
    /// # Errors
    ///
    /// See [`ComplaintLifecycle::submit`].
    pub async fn submit(
        &self,
        form: &ComplaintForm,
        files: Vec<PendingFile>,
    ) -> Result<ComplaintId, SubmitError> {
        self.lifecycle.submit(form, files).await
    }

    /// Flips a complaint's resolved flag.
    ///
    /// # Errors
    ///
    /// See [`ComplaintLifecycle::toggle_resolved`].
    pub async fn toggle_resolved(&self, id: &ComplaintId) -> Result<bool, UpdateError> {
        self.lifecycle.toggle_resolved(id).await
    }

    /// Deletes a complaint after confirmation.
    ///
    /// # Errors
    ///
    /// See [`ComplaintLifecycle::delete`].
    pub async fn delete(
        &self,
        id: &ComplaintId,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome, DeleteError> {
        self.lifecycle.delete(id, confirm).await
    }

    /// Round-trips a probe object through file storage.
    ///
    /// # Errors
    ///
    /// Returns an error if storage is disabled or the probe fails.
    pub async fn test_storage(&self) -> Result<String, StorageError> {
        let Some(store) = &self.attachments else {
            self.notifier.notify(STORAGE_MISSING, NoticeLevel::Error);
            return Err(StorageError::Disabled);
        };

        self.notifier.notify(TESTING_STORAGE, NoticeLevel::Info);
        match store.probe().await {
            Ok(url) => {
                tracing::info!(url = %url, "Storage probe succeeded");
                self.notifier.notify(STORAGE_OK, NoticeLevel::Success);
                Ok(url)
            }
            Err(err) => {
                tracing::error!(error = %err, "Storage probe failed");
                self.notifier
                    .notify(&format!("Storage test failed: {err}"), NoticeLevel::Error);
                Err(err)
            }
        }
    }

    /// Stops syncing. Also happens on drop.
    pub fn close(&self) {
        self.sync.stop();
    }
}
