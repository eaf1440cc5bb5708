//! Integration tests for the SeaORM document backend on in-memory SQLite.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use grievance_core::attachment::PendingFile;
use grievance_core::complaint::{Complaint, ComplaintForm};
use grievance_core::lifecycle::DeleteOutcome;
use grievance_core::notify::{Notifier, Renderer, TracingNotifier};
use grievance_core::repository::{
    BackendMode, DocumentBackend, DocumentError, DocumentFields, DocumentRecord, Direction,
    SnapshotStream,
};
use grievance_core::storage::{StorageConfig, StorageProvider, StorageService};
use grievance_core::{Session, SessionSettings};
use grievance_db::migration::{Migrator, MigratorTrait};
use grievance_db::{SeaDocumentBackend, connect};
use grievance_shared::config::DocumentConfig;
use serde_json::{Value, json};

fn sqlite_config(url: String) -> DocumentConfig {
    DocumentConfig {
        url: Some(url),
        max_connections: 1,
        min_connections: 1,
        run_migrations: true,
        poll_interval_ms: 50,
    }
}

async fn backend() -> SeaDocumentBackend {
    let db = connect(&sqlite_config("sqlite::memory:".to_string()))
        .await
        .expect("connect to sqlite");
    Migrator::up(&db, None).await.expect("migrations apply");
    SeaDocumentBackend::new(db)
}

fn fields(value: Value) -> DocumentFields {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

async fn next(stream: &mut SnapshotStream) -> Vec<DocumentRecord> {
    tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("snapshot in time")
        .expect("stream open")
        .expect("snapshot ok")
}

#[tokio::test]
async fn test_ping() {
    assert!(backend().await.ping().await.is_ok());
}

#[tokio::test]
async fn test_create_assigns_id_and_server_timestamp() {
    let store = backend().await;

    let id = store
        .create_record("complaints", fields(json!({"studentName": "Asha"})), "timestamp")
        .await
        .expect("create");

    let mut snapshots = store
        .subscribe("complaints", "timestamp", Direction::Descending)
        .await
        .expect("subscribe");
    let records = next(&mut snapshots).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert_eq!(records[0].fields["studentName"], "Asha");
    assert!(records[0].fields["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn test_snapshots_follow_writes_newest_first() {
    let store = backend().await;
    let mut snapshots = store
        .subscribe("complaints", "timestamp", Direction::Descending)
        .await
        .expect("subscribe");
    assert!(next(&mut snapshots).await.is_empty());

    store
        .create_record("complaints", fields(json!({"studentName": "Asha"})), "timestamp")
        .await
        .expect("create");
    assert_eq!(next(&mut snapshots).await.len(), 1);

    tokio::time::sleep(Duration::from_millis(2)).await;
    store
        .create_record("complaints", fields(json!({"studentName": "Ravi"})), "timestamp")
        .await
        .expect("create");
    let records = next(&mut snapshots).await;

    let names: Vec<_> = records
        .iter()
        .map(|r| r.fields["studentName"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(names, ["Ravi", "Asha"]);
}

#[tokio::test]
async fn test_other_collections_do_not_wake_subscribers() {
    let store = backend().await;
    let mut snapshots = store
        .subscribe("complaints", "timestamp", Direction::Descending)
        .await
        .expect("subscribe");
    next(&mut snapshots).await;

    store
        .create_record("notes", fields(json!({"text": "hi"})), "timestamp")
        .await
        .expect("create");

    let woke = tokio::time::timeout(Duration::from_millis(100), snapshots.next()).await;
    assert!(woke.is_err());
}

#[tokio::test]
async fn test_update_merges_fields() {
    let store = backend().await;
    let id = store
        .create_record(
            "complaints",
            fields(json!({"studentName": "Asha", "resolved": false})),
            "timestamp",
        )
        .await
        .expect("create");

    store
        .update_record("complaints", &id, fields(json!({"resolved": true})))
        .await
        .expect("update");

    let mut snapshots = store
        .subscribe("complaints", "timestamp", Direction::Descending)
        .await
        .expect("subscribe");
    let records = next(&mut snapshots).await;
    assert_eq!(records[0].fields["resolved"], true);
    assert_eq!(records[0].fields["studentName"], "Asha");
}

#[tokio::test]
async fn test_update_missing_document() {
    let store = backend().await;
    let err = store
        .update_record("complaints", "missing", fields(json!({"resolved": true})))
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let store = backend().await;
    let id = store
        .create_record("complaints", fields(json!({"studentName": "Asha"})), "timestamp")
        .await
        .expect("create");

    store.delete_record("complaints", &id).await.expect("delete");
    store
        .delete_record("complaints", &id)
        .await
        .expect("second delete succeeds");

    let mut snapshots = store
        .subscribe("complaints", "timestamp", Direction::Descending)
        .await
        .expect("subscribe");
    assert!(next(&mut snapshots).await.is_empty());
}

#[tokio::test]
async fn test_writes_from_another_process_reach_subscribers() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("board.db");
    let config = sqlite_config(format!("sqlite://{}?mode=rwc", path.display()));

    let watcher_db = connect(&config).await.expect("connect watcher");
    Migrator::up(&watcher_db, None).await.expect("migrations apply");
    let watcher = SeaDocumentBackend::new(watcher_db)
        .with_poll_interval(Duration::from_millis(config.poll_interval_ms));
    let writer = SeaDocumentBackend::new(connect(&config).await.expect("connect writer"));

    let mut snapshots = watcher
        .subscribe("complaints", "timestamp", Direction::Descending)
        .await
        .expect("subscribe");
    assert!(next(&mut snapshots).await.is_empty());

    let id = writer
        .create_record(
            "complaints",
            fields(json!({"studentName": "Asha", "resolved": false})),
            "timestamp",
        )
        .await
        .expect("create");
    let records = next(&mut snapshots).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);

    writer
        .update_record("complaints", &id, fields(json!({"resolved": true})))
        .await
        .expect("update");
    assert_eq!(next(&mut snapshots).await[0].fields["resolved"], true);

    writer.delete_record("complaints", &id).await.expect("delete");
    assert!(next(&mut snapshots).await.is_empty());
}

#[tokio::test]
async fn test_unchanged_collection_is_not_re_sent() {
    let store = backend().await.with_poll_interval(Duration::from_millis(20));
    let mut snapshots = store
        .subscribe("complaints", "timestamp", Direction::Descending)
        .await
        .expect("subscribe");
    next(&mut snapshots).await;

    let woke = tokio::time::timeout(Duration::from_millis(150), snapshots.next()).await;
    assert!(woke.is_err());
}

struct NoRender;

impl Renderer for NoRender {
    fn render(&self, _complaints: &[Complaint]) {}
}

#[tokio::test]
async fn test_session_over_sqlite_and_memory_storage() {
    let storage = StorageService::from_config(StorageConfig::new(StorageProvider::Memory))
        .expect("memory storage");
    let objects = storage.clone();
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let session = Session::open(
        Some(backend().await),
        Some(storage),
        SessionSettings::default(),
        Arc::new(NoRender),
        notifier,
    )
    .await
    .expect("session");

    assert_eq!(session.mode(), BackendMode::Remote);
    assert!(session.attachments_enabled());

    let form = ComplaintForm {
        student_name: "Asha".to_string(),
        floor_number: "3".to_string(),
        flat_number: "3B".to_string(),
        issue_type: "plumbing".to_string(),
        description: "leak".to_string(),
    };
    let photo = PendingFile::new("tap.jpg", "image/jpeg", &b"jpeg"[..]);
    let id = session.submit(&form, vec![photo]).await.expect("submit");

    let complaint = wait_until(|| session.find(&id)).await;
    assert_eq!(complaint.attachments.len(), 1);
    let path = complaint.attachment_paths().remove(0);
    assert!(objects.exists(&path).await);

    assert!(session.toggle_resolved(&id).await.expect("toggle"));
    wait_until(|| session.find(&id).filter(|c| c.resolved)).await;

    let outcome = session.delete(&id, &true).await.expect("delete");
    assert_eq!(outcome, DeleteOutcome::Deleted);
    wait_until(|| session.complaints().is_empty().then_some(())).await;
    assert!(!objects.exists(&path).await);

    session.close();
}

async fn wait_until<T>(mut check: impl FnMut() -> Option<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Some(value) = check() {
                return value;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition reached in time")
}
