//! Subscription owner and render trigger.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use grievance_shared::types::{ComplaintId, NoticeLevel};

use super::error::SyncError;
use super::set::ComplaintSet;
use crate::complaint::Complaint;
use crate::notify::{Notifier, Renderer};
use crate::repository::{ComplaintRepository, Listener, Subscription};

const LOAD_FAILED: &str = "Error loading complaints. Check your backend configuration.";

/// Owns the live subscription and the complaint list it feeds.
pub struct SyncController {
    complaints: Arc<ComplaintSet>,
    renderer: Arc<dyn Renderer>,
    notifier: Arc<dyn Notifier>,
    subscription: Mutex<Option<Subscription>>,
}

impl SyncController {
    /// Create a stopped controller with an empty list.
    #[must_use]
    pub fn new(renderer: Arc<dyn Renderer>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            complaints: Arc::new(ComplaintSet::new()),
            renderer,
            notifier,
            subscription: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Subscription>> {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribes to `repository`. Each snapshot replaces the list and re-renders.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::AlreadyStarted` if a subscription is already live.
    pub fn start<R: ComplaintRepository>(&self, repository: &R) -> Result<(), SyncError> {
        let mut slot = self.slot();
        if slot.is_some() {
            return Err(SyncError::AlreadyStarted);
        }

        let complaints = Arc::clone(&self.complaints);
        let renderer = Arc::clone(&self.renderer);
        let notifier = Arc::clone(&self.notifier);
        let listener: Listener = Arc::new(move |snapshot| match snapshot {
            Ok(list) => {
                tracing::debug!(count = list.len(), "Complaint snapshot received");
                complaints.replace(list);
                renderer.render(&complaints.snapshot());
            }
            Err(err) => {
                tracing::error!(error = %err, "Complaint subscription failed");
                notifier.notify(LOAD_FAILED, NoticeLevel::Error);
            }
        });

        *slot = Some(repository.subscribe(listener));
        tracing::info!(mode = %repository.mode(), "Complaint sync started");
        Ok(())
    }

    /// Releases the subscription. Does nothing when already stopped.
    pub fn stop(&self) {
        let subscription = self.slot().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
            tracing::info!("Complaint sync stopped");
        }
    }

    /// Whether a subscription is live.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.slot().is_some()
    }

    /// Clone of the current list.
    #[must_use]
    pub fn complaints(&self) -> Vec<Complaint> {
        self.complaints.snapshot()
    }

    /// Looks a complaint up in the current list.
    #[must_use]
    pub fn find(&self, id: &ComplaintId) -> Option<Complaint> {
        self.complaints.find(id)
    }

    /// Shared read handle on the list.
    #[must_use]
    pub fn view(&self) -> Arc<ComplaintSet> {
        Arc::clone(&self.complaints)
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        self.stop();
    }
}
