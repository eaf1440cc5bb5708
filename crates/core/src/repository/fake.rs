//! In-process document backend for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::watch;

use super::document::{
    DocumentBackend, DocumentError, DocumentFields, DocumentRecord, Direction, SnapshotStream,
};

#[derive(Default)]
struct FakeState {
    collections: HashMap<String, Vec<DocumentRecord>>,
    next_id: u64,
    offline: bool,
    hang_ping: bool,
    fail_writes: bool,
    push_error: Option<DocumentError>,
}

struct Inner {
    state: Mutex<FakeState>,
    version: watch::Sender<u64>,
}

/// Document backend keeping every collection in memory.
#[derive(Clone)]
pub(crate) struct FakeDocuments {
    inner: Arc<Inner>,
}

impl FakeDocuments {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(FakeState::default()),
                version,
            }),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    fn changed(&self) {
        self.inner.version.send_modify(|v| *v += 1);
    }

    /// Makes `ping` fail and every write fail.
    pub(crate) fn set_offline(&self, offline: bool) {
        self.with_state(|s| s.offline = offline);
    }

    /// Makes `ping` never complete.
    pub(crate) fn hang_ping(&self) {
        self.with_state(|s| s.hang_ping = true);
    }

    /// Makes create, update and delete fail while reads still work.
    pub(crate) fn fail_writes(&self, fail: bool) {
        self.with_state(|s| s.fail_writes = fail);
    }

    /// Delivers `err` to the next snapshot read.
    pub(crate) fn push_error(&self, err: DocumentError) {
        self.with_state(|s| s.push_error = Some(err));
        self.changed();
    }

    pub(crate) fn insert_raw(&self, collection: &str, id: &str, fields: DocumentFields) {
        self.with_state(|s| {
            s.collections
                .entry(collection.to_string())
                .or_default()
                .push(DocumentRecord {
                    id: id.to_string(),
                    fields,
                });
        });
        self.changed();
    }

    pub(crate) fn record(&self, collection: &str, id: &str) -> Option<DocumentRecord> {
        self.with_state(|s| {
            s.collections
                .get(collection)
                .and_then(|records| records.iter().find(|r| r.id == id).cloned())
        })
    }

    pub(crate) fn len(&self, collection: &str) -> usize {
        self.with_state(|s| s.collections.get(collection).map_or(0, Vec::len))
    }

    fn check_writable(state: &FakeState) -> Result<(), DocumentError> {
        if state.offline {
            return Err(DocumentError::unavailable("offline"));
        }
        if state.fail_writes {
            return Err(DocumentError::operation("write rejected"));
        }
        Ok(())
    }

    fn snapshot(
        &self,
        collection: &str,
        order_field: &str,
        direction: Direction,
    ) -> Result<Vec<DocumentRecord>, DocumentError> {
        self.with_state(|s| {
            if let Some(err) = s.push_error.take() {
                return Err(err);
            }
            let mut records = s.collections.get(collection).cloned().unwrap_or_default();
            let key = |r: &DocumentRecord| {
                r.fields
                    .get(order_field)
                    .and_then(Value::as_str)
                    .map(str::to_string)
            };
            match direction {
                Direction::Ascending => records.sort_by_key(key),
                Direction::Descending => records.sort_by(|a, b| key(b).cmp(&key(a))),
            }
            Ok(records)
        })
    }
}

impl DocumentBackend for FakeDocuments {
    async fn create_record(
        &self,
        collection: &str,
        mut fields: DocumentFields,
        server_timestamp_field: &str,
    ) -> Result<String, DocumentError> {
        let id = self.with_state(|s| {
            Self::check_writable(s)?;
            s.next_id += 1;
            let id = format!("doc-{}", s.next_id);
            fields.insert(
                server_timestamp_field.to_string(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)),
            );
            s.collections
                .entry(collection.to_string())
                .or_default()
                .push(DocumentRecord {
                    id: id.clone(),
                    fields,
                });
            Ok::<_, DocumentError>(id)
        })?;
        self.changed();
        Ok(id)
    }

    async fn update_record(
        &self,
        collection: &str,
        id: &str,
        patch: DocumentFields,
    ) -> Result<(), DocumentError> {
        self.with_state(|s| {
            Self::check_writable(s)?;
            let record = s
                .collections
                .get_mut(collection)
                .and_then(|records| records.iter_mut().find(|r| r.id == id))
                .ok_or_else(|| DocumentError::not_found(collection, id))?;
            record.fields.extend(patch);
            Ok::<_, DocumentError>(())
        })?;
        self.changed();
        Ok(())
    }

    async fn delete_record(&self, collection: &str, id: &str) -> Result<(), DocumentError> {
        self.with_state(|s| {
            Self::check_writable(s)?;
            if let Some(records) = s.collections.get_mut(collection) {
                records.retain(|r| r.id != id);
            }
            Ok::<_, DocumentError>(())
        })?;
        self.changed();
        Ok(())
    }

    async fn subscribe(
        &self,
        collection: &str,
        order_field: &str,
        direction: Direction,
    ) -> Result<SnapshotStream, DocumentError> {
        let receiver = self.inner.version.subscribe();
        let collection = collection.to_string();
        let order_field = order_field.to_string();

        let stream = futures::stream::unfold(
            (self.clone(), receiver, true),
            move |(documents, mut receiver, first)| {
                let collection = collection.clone();
                let order_field = order_field.clone();
                async move {
                    if !first && receiver.changed().await.is_err() {
                        return None;
                    }
                    let snapshot = documents.snapshot(&collection, &order_field, direction);
                    Some((snapshot, (documents, receiver, false)))
                }
            },
        );
        Ok(stream.boxed())
    }

    async fn ping(&self) -> Result<(), DocumentError> {
        let (offline, hang) = self.with_state(|s| (s.offline, s.hang_ping));
        if hang {
            futures::future::pending::<()>().await;
        }
        if offline {
            return Err(DocumentError::unavailable("offline"));
        }
        Ok(())
    }
}
