//! Realtime document store over the `documents` table.
//!
//! Writes made through this backend wake its subscribers at once. Writes from
//! other processes arrive through Postgres `LISTEN/NOTIFY` when the database is
//! Postgres, and through periodic re-reads on any database. Each wake-up
//! re-queries the collection; a snapshot is only yielded when it differs from
//! the last one the subscriber saw.

use std::cmp::Ordering;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use futures::StreamExt;
use grievance_core::repository::{
    DocumentBackend, DocumentError, DocumentFields, DocumentRecord, Direction, SnapshotStream,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbBackend, DbErr, EntityTrait, QueryFilter, QueryOrder, Statement,
};
use serde_json::Value;
use sqlx::postgres::{PgListener, PgPool};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use uuid::Uuid;

use crate::entities::documents;

/// Pending change notices kept per subscriber before it lags.
const CHANGE_BUFFER: usize = 64;

/// Postgres notification channel carrying the changed collection name.
pub const CHANGE_CHANNEL: &str = "grievance_documents";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Document backend on a SeaORM connection.
#[derive(Debug, Clone)]
pub struct SeaDocumentBackend {
    db: DatabaseConnection,
    changes: broadcast::Sender<String>,
    poll_interval: Option<Duration>,
    listener: Arc<OnceLock<ListenerTask>>,
}

impl SeaDocumentBackend {
    /// Create a backend over an open connection, re-reading every second.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            db,
            changes,
            poll_interval: Some(DEFAULT_POLL_INTERVAL),
            listener: Arc::default(),
        }
    }

    /// Sets how often subscribers re-read. Zero turns polling off.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = (!interval.is_zero()).then_some(interval);
        self
    }

    /// The underlying connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn is_postgres(&self) -> bool {
        self.db.get_database_backend() == DbBackend::Postgres
    }

    async fn publish(&self, collection: &str) {
        // No subscribers is fine
        let _ = self.changes.send(collection.to_string());

        if self.is_postgres() {
            let notify = Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT pg_notify($1, $2)",
                [
                    sea_orm::Value::from(CHANGE_CHANNEL),
                    sea_orm::Value::from(collection),
                ],
            );
            if let Err(err) = self.db.execute(notify).await {
                tracing::warn!(error = %err, collection, "Could not notify other processes");
            }
        }
    }

    /// Starts forwarding Postgres notifications once per backend.
    fn ensure_listener(&self) {
        if !self.is_postgres() {
            return;
        }
        self.listener.get_or_init(|| {
            let pool = self.db.get_postgres_connection_pool().clone();
            ListenerTask(tokio::spawn(forward_notifications(
                pool,
                self.changes.clone(),
            )))
        });
    }

    async fn snapshot(
        db: &DatabaseConnection,
        collection: &str,
        order_field: &str,
        direction: Direction,
    ) -> Result<Vec<DocumentRecord>, DocumentError> {
        let models = documents::Entity::find()
            .filter(documents::Column::Collection.eq(collection))
            .order_by_desc(documents::Column::CreatedAt)
            .order_by_desc(documents::Column::Id)
            .all(db)
            .await
            .map_err(db_error)?;

        let mut records: Vec<DocumentRecord> = models
            .into_iter()
            .filter_map(|model| match model.fields {
                Value::Object(fields) => Some(DocumentRecord {
                    id: model.id,
                    fields,
                }),
                _ => {
                    tracing::warn!(id = %model.id, collection, "Document body is not an object");
                    None
                }
            })
            .collect();

        let key = |record: &DocumentRecord| record.fields.get(order_field).cloned();
        match direction {
            Direction::Ascending => records.sort_by(|a, b| compare_values(key(a), key(b))),
            Direction::Descending => records.sort_by(|a, b| compare_values(key(b), key(a))),
        }
        Ok(records)
    }
}

impl DocumentBackend for SeaDocumentBackend {
    async fn create_record(
        &self,
        collection: &str,
        mut fields: DocumentFields,
        server_timestamp_field: &str,
    ) -> Result<String, DocumentError> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now();
        fields.insert(
            server_timestamp_field.to_string(),
            Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );

        documents::ActiveModel {
            id: Set(id.clone()),
            collection: Set(collection.to_string()),
            fields: Set(Value::Object(fields)),
            created_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(db_error)?;

        tracing::debug!(id = %id, collection, "Document created");
        self.publish(collection).await;
        Ok(id)
    }

    async fn update_record(
        &self,
        collection: &str,
        id: &str,
        patch: DocumentFields,
    ) -> Result<(), DocumentError> {
        let model = documents::Entity::find_by_id(id.to_string())
            .filter(documents::Column::Collection.eq(collection))
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or_else(|| DocumentError::not_found(collection, id))?;

        let mut fields = match model.fields.clone() {
            Value::Object(fields) => fields,
            _ => DocumentFields::new(),
        };
        fields.extend(patch);

        let mut active: documents::ActiveModel = model.into();
        active.fields = Set(Value::Object(fields));
        active.update(&self.db).await.map_err(db_error)?;

        tracing::debug!(id, collection, "Document updated");
        self.publish(collection).await;
        Ok(())
    }

    async fn delete_record(&self, collection: &str, id: &str) -> Result<(), DocumentError> {
        let result = documents::Entity::delete_many()
            .filter(documents::Column::Id.eq(id))
            .filter(documents::Column::Collection.eq(collection))
            .exec(&self.db)
            .await
            .map_err(db_error)?;

        if result.rows_affected == 0 {
            tracing::debug!(id, collection, "Document already gone");
        }
        self.publish(collection).await;
        Ok(())
    }

    async fn subscribe(
        &self,
        collection: &str,
        order_field: &str,
        direction: Direction,
    ) -> Result<SnapshotStream, DocumentError> {
        self.ensure_listener();

        let poll = self.poll_interval.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        let state = Watch {
            db: self.db.clone(),
            changes: self.changes.subscribe(),
            poll,
            collection: collection.to_string(),
            order_field: order_field.to_string(),
            direction,
            started: false,
            last: None,
        };

        let stream = futures::stream::unfold(state, |mut state| async move {
            loop {
                if state.started && !state.wait_for_change().await {
                    return None;
                }
                state.started = true;

                match Self::snapshot(&state.db, &state.collection, &state.order_field, state.direction)
                    .await
                {
                    Ok(records) if state.last.as_ref() == Some(&records) => {}
                    Ok(records) => {
                        state.last = Some(records.clone());
                        return Some((Ok(records), state));
                    }
                    Err(err) => return Some((Err(err), state)),
                }
            }
        });

        Ok(stream.boxed())
    }

    async fn ping(&self) -> Result<(), DocumentError> {
        self.db
            .ping()
            .await
            .map_err(|e| DocumentError::unavailable(e.to_string()))
    }
}

/// Aborts the notification forwarder when the last backend clone goes away.
#[derive(Debug)]
struct ListenerTask(JoinHandle<()>);

impl Drop for ListenerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn forward_notifications(pool: PgPool, changes: broadcast::Sender<String>) {
    let mut listener = match PgListener::connect_with(&pool).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::warn!(error = %err, "Change notifications unavailable, relying on polling");
            return;
        }
    };
    if let Err(err) = listener.listen(CHANGE_CHANNEL).await {
        tracing::warn!(error = %err, channel = CHANGE_CHANNEL, "Could not listen for changes");
        return;
    }

    loop {
        match listener.recv().await {
            Ok(notification) => {
                let _ = changes.send(notification.payload().to_string());
            }
            Err(err) => {
                tracing::warn!(error = %err, "Change notification stream ended");
                return;
            }
        }
    }
}

/// Per-subscriber stream state.
struct Watch {
    db: DatabaseConnection,
    changes: broadcast::Receiver<String>,
    poll: Option<Interval>,
    collection: String,
    order_field: String,
    direction: Direction,
    started: bool,
    last: Option<Vec<DocumentRecord>>,
}

impl Watch {
    /// Waits for a write to this collection or the next poll. False once the
    /// store is gone.
    async fn wait_for_change(&mut self) -> bool {
        let Self {
            changes,
            poll,
            collection,
            ..
        } = self;

        loop {
            let tick = async {
                match poll.as_mut() {
                    Some(interval) => {
                        interval.tick().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                received = changes.recv() => match received {
                    Ok(changed) if changed == *collection => return true,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, collection = %collection, "Subscriber lagged, refreshing");
                        return true;
                    }
                    Err(RecvError::Closed) => return false,
                },
                () = tick => return true,
            }
        }
    }
}

/// Orders field values: missing first, then numbers or strings by value.
fn compare_values(a: Option<Value>, b: Option<Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(&b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(&b),
        _ => Ordering::Equal,
    }
}

fn db_error(err: DbErr) -> DocumentError {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => DocumentError::unavailable(err.to_string()),
        _ => DocumentError::operation(err.to_string()),
    }
}
