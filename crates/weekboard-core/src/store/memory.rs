//! In-memory document store.
//!
//! Backs unit tests and ephemeral runs. One mutex guards the whole
//! store, so every batch is trivially atomic and the conditional batch
//! performs its emptiness check and its writes without anything
//! interleaving. Snapshots fan out to subscribers on every mutation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use super::{BatchOutcome, CollectionRef, Document, DocumentStore, Filter, Subscription};
use crate::error::StoreError;
use crate::model::DocId;

struct Subscriber {
    path: String,
    filter: Option<Filter>,
    tx: watch::Sender<Vec<Document>>,
}

#[derive(Default)]
struct Inner {
    /// Collection path to documents, in creation order.
    collections: HashMap<String, Vec<Document>>,
    subscribers: Vec<Subscriber>,
    offline: bool,
}

impl Inner {
    fn snapshot_for(&self, path: &str, filter: Option<&Filter>) -> Vec<Document> {
        self.collections
            .get(path)
            .map(|docs| {
                docs.iter()
                    .filter(|d| filter.map_or(true, |f| f.matches(&d.data)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn notify(&mut self, path: &str) {
        self.subscribers.retain(|s| !s.tx.is_closed());
        for sub in self.subscribers.iter().filter(|s| s.path == path) {
            let snapshot = self
                .collections
                .get(path)
                .map(|docs| {
                    docs.iter()
                        .filter(|d| sub.filter.as_ref().map_or(true, |f| f.matches(&d.data)))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            let _ = sub.tx.send(snapshot);
        }
    }
}

/// In-process store for tests and `memory` backend runs.
///
/// [`set_offline`](MemoryStore::set_offline) makes every operation fail
/// with [`StoreError::Unavailable`], for exercising failure paths the
/// way a dropped connection would.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates losing the connection to the backend.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.offline = offline;
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::Unavailable)?;
        if inner.offline {
            return Err(StoreError::Unavailable);
        }
        Ok(inner)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn subscribe(
        &self,
        collection: &CollectionRef,
        filter: Option<Filter>,
    ) -> Result<Subscription, StoreError> {
        let mut inner = self.lock()?;
        let initial = inner.snapshot_for(collection.as_str(), filter.as_ref());
        let (tx, rx) = watch::channel(initial);
        inner.subscribers.push(Subscriber {
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
        let inner = self.lock()?;
        Ok(inner.snapshot_for(collection.as_str(), filter.as_ref()))
    }

    async fn get(
        &self,
        collection: &CollectionRef,
        id: &DocId,
    ) -> Result<Option<Document>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .collections
            .get(collection.as_str())
            .and_then(|docs| docs.iter().find(|d| &d.id == id))
            .cloned())
    }

    async fn create(&self, collection: &CollectionRef, data: Value) -> Result<DocId, StoreError> {
        let mut inner = self.lock()?;
        let id = DocId::new(Uuid::new_v4().to_string());
        inner
            .collections
            .entry(collection.as_str().to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                data,
            });
        inner.notify(collection.as_str());
        Ok(id)
    }

    async fn update(
        &self,
        collection: &CollectionRef,
        id: &DocId,
        data: Value,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let doc = inner
            .collections
            .get_mut(collection.as_str())
            .and_then(|docs| docs.iter_mut().find(|d| &d.id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.as_str().to_string(),
                id: id.to_string(),
            })?;
        doc.data = data;
        inner.notify(collection.as_str());
        Ok(())
    }

    async fn delete(&self, collection: &CollectionRef, id: &DocId) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let docs = inner
            .collections
            .get_mut(collection.as_str())
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.as_str().to_string(),
                id: id.to_string(),
            })?;
        let before = docs.len();
        docs.retain(|d| &d.id != id);
        if docs.len() == before {
            return Err(StoreError::NotFound {
                collection: collection.as_str().to_string(),
                id: id.to_string(),
            });
        }
        inner.notify(collection.as_str());
        Ok(())
    }

    async fn create_many(
        &self,
        collection: &CollectionRef,
        docs: Vec<Value>,
    ) -> Result<Vec<DocId>, StoreError> {
        // The whole batch lands under one lock acquisition, so it is
        // atomic with respect to every other operation.
        let mut inner = self.lock()?;
        let entry = inner
            .collections
            .entry(collection.as_str().to_string())
            .or_default();
        let mut ids = Vec::with_capacity(docs.len());
        for data in docs {
            let id = DocId::new(Uuid::new_v4().to_string());
            entry.push(Document {
                id: id.clone(),
                data,
            });
            ids.push(id);
        }
        inner.notify(collection.as_str());
        Ok(ids)
    }

    async fn create_many_if_absent(
        &self,
        collection: &CollectionRef,
        guard: Filter,
        docs: Vec<Value>,
    ) -> Result<BatchOutcome, StoreError> {
        let mut inner = self.lock()?;
        let existing = inner
            .snapshot_for(collection.as_str(), Some(&guard))
            .len();
        if existing > 0 {
            return Ok(BatchOutcome::Skipped { existing });
        }
        let created = docs.len();
        let entry = inner
            .collections
            .entry(collection.as_str().to_string())
            .or_default();
        for data in docs {
            entry.push(Document {
                id: DocId::new(Uuid::new_v4().to_string()),
                data,
            });
        }
        inner.notify(collection.as_str());
        Ok(BatchOutcome::Committed { created })
    }
}
