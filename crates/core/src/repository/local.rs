//! In-memory fallback repository.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use grievance_shared::types::ComplaintId;

use super::{BackendMode, ComplaintRepository, Listener, RepositoryError, Subscription};
use crate::complaint::{Complaint, ComplaintPatch, NewComplaint, sort_newest_first};

#[derive(Default)]
struct LocalState {
    complaints: Vec<Complaint>,
    listeners: Vec<(u64, Listener)>,
    next_listener: u64,
    last_id: i64,
}

impl LocalState {
    /// Millisecond clock reading, bumped so ids never repeat.
    fn next_id(&mut self) -> ComplaintId {
        let id = Utc::now().timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        ComplaintId::new(id.to_string())
    }

    fn position(&self, id: &ComplaintId) -> Result<usize, RepositoryError> {
        self.complaints
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| RepositoryError::not_found(id.clone()))
    }
}

type Notification = (Vec<Complaint>, Vec<Listener>);

/// Complaints kept only for the lifetime of the session.
#[derive(Clone, Default)]
pub struct LocalBackend {
    state: Arc<Mutex<LocalState>>,
}

impl LocalBackend {
    /// Create an empty local list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored complaints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().complaints.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs a mutation, then calls every listener once the lock is released.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut LocalState) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let (value, (snapshot, listeners)): (T, Notification) = {
            let mut state = self.lock();
            let value = f(&mut state)?;
            let listeners = state.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            (value, (state.complaints.clone(), listeners))
        };

        for listener in listeners {
            listener(Ok(snapshot.clone()));
        }
        Ok(value)
    }
}

impl ComplaintRepository for LocalBackend {
    async fn create(&self, complaint: NewComplaint) -> Result<ComplaintId, RepositoryError> {
        self.mutate(|state| {
            let id = state.next_id();
            let complaint = Complaint::from_new(id.clone(), Utc::now(), complaint);
            state.complaints.insert(0, complaint);
            sort_newest_first(&mut state.complaints);
            tracing::info!(id = %id, "Complaint stored locally");
            Ok(id)
        })
    }

    async fn update(&self, id: &ComplaintId, patch: ComplaintPatch) -> Result<(), RepositoryError> {
        self.mutate(|state| {
            let index = state.position(id)?;
            state.complaints[index].apply(&patch);
            Ok(())
        })
    }

    async fn delete(&self, id: &ComplaintId) -> Result<(), RepositoryError> {
        self.mutate(|state| {
            let index = state.position(id)?;
            state.complaints.remove(index);
            Ok(())
        })
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        let (key, snapshot) = {
            let mut state = self.lock();
            let key = state.next_listener;
            state.next_listener += 1;
            state.listeners.push((key, Arc::clone(&listener)));
            (key, state.complaints.clone())
        };

        listener(Ok(snapshot));

        let state: Weak<Mutex<LocalState>> = Arc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                state.listeners.retain(|(k, _)| *k != key);
            }
        })
    }

    fn mode(&self) -> BackendMode {
        BackendMode::Local
    }
}
