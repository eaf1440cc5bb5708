//! Repository over a realtime document collection.

use std::sync::Arc;

use futures::StreamExt;
use grievance_shared::types::ComplaintId;
use serde::Serialize;
use serde_json::Value;

use super::document::{DocumentBackend, DocumentError, DocumentFields, DocumentRecord, Direction};
use super::{BackendMode, ComplaintRepository, Listener, RepositoryError, Subscription};
use crate::complaint::{Complaint, ComplaintPatch, NewComplaint, sort_newest_first};

/// Field the backend stamps with its own clock on create.
const TIMESTAMP_FIELD: &str = "timestamp";

/// Complaints stored as documents in a remote collection.
pub struct RemoteBackend<D: DocumentBackend> {
    documents: Arc<D>,
    collection: String,
}

impl<D: DocumentBackend> RemoteBackend<D> {
    /// Create a repository over `collection`.
    #[must_use]
    pub fn new(documents: D, collection: impl Into<String>) -> Self {
        Self {
            documents: Arc::new(documents),
            collection: collection.into(),
        }
    }

    /// Collection name.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The document backend.
    #[must_use]
    pub fn documents(&self) -> &D {
        &self.documents
    }
}

impl<D: DocumentBackend> ComplaintRepository for RemoteBackend<D> {
    async fn create(&self, complaint: NewComplaint) -> Result<ComplaintId, RepositoryError> {
        let fields = to_fields(&complaint)?;
        let id = self
            .documents
            .create_record(&self.collection, fields, TIMESTAMP_FIELD)
            .await?;

        tracing::info!(id = %id, collection = %self.collection, "Complaint stored");
        Ok(ComplaintId::new(id))
    }

    async fn update(&self, id: &ComplaintId, patch: ComplaintPatch) -> Result<(), RepositoryError> {
        let fields = to_fields(&patch)?;
        self.documents
            .update_record(&self.collection, id.as_str(), fields)
            .await
            .map_err(|err| match err {
                DocumentError::NotFound { .. } => RepositoryError::not_found(id.clone()),
                other => other.into(),
            })
    }

    async fn delete(&self, id: &ComplaintId) -> Result<(), RepositoryError> {
        self.documents
            .delete_record(&self.collection, id.as_str())
            .await?;
        Ok(())
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        let documents = Arc::clone(&self.documents);
        let collection = self.collection.clone();

        let task = tokio::spawn(async move {
            let mut snapshots = match documents
                .subscribe(&collection, TIMESTAMP_FIELD, Direction::Descending)
                .await
            {
                Ok(stream) => stream,
                Err(err) => {
                    tracing::error!(collection = %collection, error = %err, "Could not subscribe to complaints");
                    listener(Err(err.into()));
                    return;
                }
            };

            while let Some(snapshot) = snapshots.next().await {
                listener(snapshot.map(decode_snapshot).map_err(RepositoryError::from));
            }
            tracing::debug!(collection = %collection, "Complaint snapshot stream closed");
        });

        Subscription::new(move || task.abort())
    }

    fn mode(&self) -> BackendMode {
        BackendMode::Remote
    }
}

fn to_fields<T: Serialize>(value: &T) -> Result<DocumentFields, RepositoryError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(RepositoryError::Encode(format!(
            "expected an object, got {other}"
        ))),
        Err(err) => Err(RepositoryError::Encode(err.to_string())),
    }
}

/// Decodes a snapshot, skipping documents that do not describe a complaint.
fn decode_snapshot(records: Vec<DocumentRecord>) -> Vec<Complaint> {
    let mut complaints: Vec<Complaint> = records
        .into_iter()
        .filter_map(|record| {
            let DocumentRecord { id, mut fields } = record;
            fields.insert("id".to_string(), Value::String(id.clone()));
            match serde_json::from_value(Value::Object(fields)) {
                Ok(complaint) => Some(complaint),
                Err(err) => {
                    tracing::warn!(id = %id, error = %err, "Skipping malformed complaint document");
                    None
                }
            }
        })
        .collect();

    sort_newest_first(&mut complaints);
    complaints
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::complaint::ComplaintForm;
    use crate::repository::fake::FakeDocuments;

    type Snapshots = Arc<Mutex<Vec<Result<Vec<Complaint>, RepositoryError>>>>;

    fn recorder() -> (Snapshots, Listener) {
        let seen: Snapshots = Arc::default();
        let sink = Arc::clone(&seen);
        let listener: Listener = Arc::new(move |snapshot| {
            sink.lock().expect("lock").push(snapshot);
        });
        (seen, listener)
    }

    async fn wait_for(seen: &Snapshots, count: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while seen.lock().expect("lock").len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("snapshot should arrive");
    }

    fn new_complaint(name: &str) -> NewComplaint {
        ComplaintForm {
            student_name: name.to_string(),
            floor_number: "3".to_string(),
            flat_number: "3B".to_string(),
            issue_type: "plumbing".to_string(),
            description: String::new(),
        }
        .validate()
        .expect("valid form")
    }

    #[tokio::test]
    async fn test_create_stamps_server_timestamp() {
        let documents = FakeDocuments::new();
        let repo = RemoteBackend::new(documents.clone(), "complaints");

        let id = repo.create(new_complaint("Asha")).await.expect("create");

        let record = documents.record("complaints", id.as_str()).expect("stored");
        assert_eq!(record.fields["studentName"], "Asha");
        assert!(record.fields["timestamp"].is_string());
        assert!(record.fields.get("id").is_none());
        assert_eq!(repo.mode(), BackendMode::Remote);
    }

    #[tokio::test]
    async fn test_update_patches_only_resolved() {
        let documents = FakeDocuments::new();
        let repo = RemoteBackend::new(documents.clone(), "complaints");
        let id = repo.create(new_complaint("Asha")).await.expect("create");

        repo.update(&id, ComplaintPatch::resolved(true))
            .await
            .expect("update");

        let record = documents.record("complaints", id.as_str()).expect("stored");
        assert_eq!(record.fields["resolved"], true);
        assert_eq!(record.fields["flatNumber"], "3B");
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let repo = RemoteBackend::new(FakeDocuments::new(), "complaints");
        let err = repo
            .update(&ComplaintId::from("missing"), ComplaintPatch::resolved(true))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_subscribe_pushes_newest_first() {
        let repo = RemoteBackend::new(FakeDocuments::new(), "complaints");
        let (seen, listener) = recorder();
        let _subscription = repo.subscribe(listener);
        wait_for(&seen, 1).await;

        repo.create(new_complaint("Asha")).await.expect("create");
        repo.create(new_complaint("Ravi")).await.expect("create");

        // Back-to-back writes may coalesce into one push; only the final set matters.
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let latest_len = seen
                    .lock()
                    .expect("lock")
                    .last()
                    .and_then(|snapshot| snapshot.as_ref().ok())
                    .map_or(0, Vec::len);
                if latest_len == 2 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("both complaints should be pushed");

        let seen = seen.lock().expect("lock");
        assert!(seen[0].as_ref().expect("initial").is_empty());
        let latest = seen.last().expect("latest").as_ref().expect("snapshot");
        let names: Vec<_> = latest.iter().map(|c| c.student_name.as_str()).collect();
        assert_eq!(names, ["Ravi", "Asha"]);
    }

    #[tokio::test]
    async fn test_malformed_documents_are_skipped() {
        let documents = FakeDocuments::new();
        let mut junk = DocumentFields::new();
        junk.insert("studentName".to_string(), Value::Bool(true));
        junk.insert("timestamp".to_string(), Value::String("2026-10-18T09:00:00Z".into()));
        documents.insert_raw("complaints", "junk", junk);

        let repo = RemoteBackend::new(documents, "complaints");
        repo.create(new_complaint("Asha")).await.expect("create");

        let (seen, listener) = recorder();
        let _subscription = repo.subscribe(listener);
        wait_for(&seen, 1).await;

        let seen = seen.lock().expect("lock");
        let snapshot = seen[0].as_ref().expect("snapshot");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].student_name, "Asha");
    }

    #[tokio::test]
    async fn test_push_errors_reach_listener() {
        let documents = FakeDocuments::new();
        let repo = RemoteBackend::new(documents.clone(), "complaints");
        let (seen, listener) = recorder();
        let _subscription = repo.subscribe(listener);
        wait_for(&seen, 1).await;

        documents.push_error(DocumentError::unavailable("connection reset"));
        wait_for(&seen, 2).await;

        assert!(matches!(
            seen.lock().expect("lock")[1],
            Err(RepositoryError::Document(DocumentError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let repo = RemoteBackend::new(FakeDocuments::new(), "complaints");
        let (seen, listener) = recorder();
        let subscription = repo.subscribe(listener);
        wait_for(&seen, 1).await;

        subscription.unsubscribe();
        repo.create(new_complaint("Asha")).await.expect("create");
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(seen.lock().expect("lock").len(), 1);
    }
}
