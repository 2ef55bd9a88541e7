//! SQLite-backed document store.
//!
//! Persists every collection in one `documents` table keyed by
//! (collection path, document id), with the JSON payload in a TEXT
//! column and a monotonic `seq` preserving creation order. Batch
//! creates and the conditional batch run inside a single transaction.
//! Subscribers get the same snapshot fan-out as the in-memory backend,
//! recomputed from the table after each mutation.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{BatchOutcome, CollectionRef, Document, DocumentStore, Filter, Subscription};
use crate::error::StoreError;
use crate::model::DocId;

struct Subscriber {
    path: String,
    filter: Option<Filter>,
    tx: watch::Sender<Vec<Document>>,
}

/// Persistent store over a local SQLite file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and migrates
    /// the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        let store = Self {
            conn: Mutex::new(conn),
            subscribers: Mutex::new(Vec::new()),
        };
        store.migrate()?;
        debug!(path = %path.display(), "sqlite store opened");
        Ok(store)
    }

    /// In-memory database for tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let store = Self {
            conn: Mutex::new(conn),
            subscribers: Mutex::new(Vec::new()),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                seq        INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id         TEXT NOT NULL,
                data       TEXT NOT NULL,
                UNIQUE (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);",
        )
        .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Unavailable)
    }

    /// All documents of one collection, in creation order.
    fn load_collection(conn: &Connection, path: &str) -> Result<Vec<Document>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT id, data FROM documents WHERE collection = ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![path], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, data) = row?;
            let data: Value =
                serde_json::from_str(&data).map_err(|e| StoreError::Decode {
                    collection: path.to_string(),
                    message: e.to_string(),
                })?;
            docs.push(Document {
                id: DocId::new(id),
                data,
            });
        }
        Ok(docs)
    }

    fn encode(path: &str, data: &Value) -> Result<String, StoreError> {
        serde_json::to_string(data).map_err(|e| StoreError::Decode {
            collection: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Redelivers snapshots to every subscriber of `path`. Called with
    /// the connection lock still held so a slower writer cannot publish
    /// an older state afterwards. The triggering mutation has already
    /// committed, so a fan-out failure is logged rather than returned.
    fn notify(&self, conn: &Connection, path: &str) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return;
        };
        subscribers.retain(|s| !s.tx.is_closed());
        if !subscribers.iter().any(|s| s.path == path) {
            return;
        }

        let all = match Self::load_collection(conn, path) {
            Ok(docs) => docs,
            Err(e) => {
                warn!(collection = path, error = %e, "snapshot redelivery failed");
                return;
            }
        };
        for sub in subscribers.iter().filter(|s| s.path == path) {
            let snapshot: Vec<Document> = all
                .iter()
                .filter(|d| sub.filter.as_ref().map_or(true, |f| f.matches(&d.data)))
                .cloned()
                .collect();
            let _ = sub.tx.send(snapshot);
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn subscribe(
        &self,
        collection: &CollectionRef,
        filter: Option<Filter>,
    ) -> Result<Subscription, StoreError> {
        let conn = self.lock_conn()?;
        let initial: Vec<Document> = Self::load_collection(&conn, collection.as_str())?
            .into_iter()
            .filter(|d| filter.as_ref().map_or(true, |f| f.matches(&d.data)))
            .collect();
        let (tx, rx) = watch::channel(initial);
        self.subscribers
            .lock()
            .map_err(|_| StoreError::Unavailable)?
            .push(Subscriber {
                path: collection.as_str().to_string(),
                filter,
                tx,
            });
        debug!(collection = %collection, "subscription opened");
        Ok(Subscription::new(rx))
    }

    async fn list(
        &self,
        collection: &CollectionRef,
        filter: Option<Filter>,
    ) -> Result<Vec<Document>, StoreError> {
        let conn = self.lock_conn()?;
        let docs = Self::load_collection(&conn, collection.as_str())?;
        Ok(docs
            .into_iter()
            .filter(|d| filter.as_ref().map_or(true, |f| f.matches(&d.data)))
            .collect())
    }

    async fn get(
        &self,
        collection: &CollectionRef,
        id: &DocId,
    ) -> Result<Option<Document>, StoreError> {
        let conn = self.lock_conn()?;
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection.as_str(), id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match data {
            None => Ok(None),
            Some(raw) => {
                let data: Value =
                    serde_json::from_str(&raw).map_err(|e| StoreError::Decode {
                        collection: collection.as_str().to_string(),
                        message: e.to_string(),
                    })?;
                Ok(Some(Document {
                    id: id.clone(),
                    data,
                }))
            }
        }
    }

    async fn create(&self, collection: &CollectionRef, data: Value) -> Result<DocId, StoreError> {
        let conn = self.lock_conn()?;
        let id = DocId::new(Uuid::new_v4().to_string());
        conn.execute(
            "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)",
            params![
                collection.as_str(),
                id.as_str(),
                Self::encode(collection.as_str(), &data)?
            ],
        )?;
        self.notify(&conn, collection.as_str());
        Ok(id)
    }

    async fn update(
        &self,
        collection: &CollectionRef,
        id: &DocId,
        data: Value,
    ) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        let changed = conn.execute(
            "UPDATE documents SET data = ?3 WHERE collection = ?1 AND id = ?2",
            params![
                collection.as_str(),
                id.as_str(),
                Self::encode(collection.as_str(), &data)?
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                collection: collection.as_str().to_string(),
                id: id.to_string(),
            });
        }
        self.notify(&conn, collection.as_str());
        Ok(())
    }

    async fn delete(&self, collection: &CollectionRef, id: &DocId) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        let changed = conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection.as_str(), id.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                collection: collection.as_str().to_string(),
                id: id.to_string(),
            });
        }
        self.notify(&conn, collection.as_str());
        Ok(())
    }

    async fn create_many(
        &self,
        collection: &CollectionRef,
        docs: Vec<Value>,
    ) -> Result<Vec<DocId>, StoreError> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(docs.len());
        for data in &docs {
            let id = DocId::new(Uuid::new_v4().to_string());
            tx.execute(
                "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)",
                params![
                    collection.as_str(),
                    id.as_str(),
                    Self::encode(collection.as_str(), data)?
                ],
            )?;
            ids.push(id);
        }
        tx.commit()?;
        self.notify(&conn, collection.as_str());
        Ok(ids)
    }

    async fn create_many_if_absent(
        &self,
        collection: &CollectionRef,
        guard: Filter,
        docs: Vec<Value>,
    ) -> Result<BatchOutcome, StoreError> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        // Guard check and inserts share the transaction, so a racing
        // writer cannot slip records in between the two.
        let existing = {
            let mut stmt =
                tx.prepare("SELECT data FROM documents WHERE collection = ?1 ORDER BY seq")?;
            let rows = stmt.query_map(params![collection.as_str()], |row| {
                row.get::<_, String>(0)
            })?;
            let mut count = 0usize;
            for row in rows {
                let data: Value =
                    serde_json::from_str(&row?).map_err(|e| StoreError::Decode {
                        collection: collection.as_str().to_string(),
                        message: e.to_string(),
                    })?;
                if guard.matches(&data) {
                    count += 1;
                }
            }
            count
        };

        if existing > 0 {
            return Ok(BatchOutcome::Skipped { existing });
        }

        let created = docs.len();
        for data in &docs {
            tx.execute(
                "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)",
                params![
                    collection.as_str(),
                    Uuid::new_v4().to_string(),
                    Self::encode(collection.as_str(), data)?
                ],
            )?;
        }
        tx.commit()?;
        self.notify(&conn, collection.as_str());
        Ok(BatchOutcome::Committed { created })
    }
}
