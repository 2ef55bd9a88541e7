//! Document store abstraction.
//!
//! Every record lives in a per-user collection addressed by an ownership
//! path: `artifacts/{app_id}/users/{user_id}/{collection}`. The store
//! contract is deliberately small:
//! - one-shot filtered queries and single-document CRUD
//! - an atomic multi-document batch create (all or none)
//! - a conditional batch create used as the carry-over commit guard
//! - live subscriptions that redeliver the full matching document set
//!   on every change, over an awaitable channel
//!
//! Two backends implement it: [`MemoryStore`] for tests and ephemeral
//! runs, [`SqliteStore`] for a persistent local file. Handles are built
//! once at startup and injected into whatever needs them; nothing in
//! this crate reaches for a global store.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::auth::UserId;
use crate::error::StoreError;
use crate::model::DocId;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Ownership prefix for one user's records within one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    app_id: String,
    user_id: UserId,
}

impl Scope {
    pub fn new(app_id: impl Into<String>, user_id: UserId) -> Self {
        Self {
            app_id: app_id.into(),
            user_id,
        }
    }

    /// Resolves a collection name under this scope.
    pub fn collection(&self, name: &str) -> CollectionRef {
        CollectionRef {
            path: format!("artifacts/{}/users/{}/{}", self.app_id, self.user_id, name),
        }
    }
}

/// Fully resolved path to one collection under a [`Scope`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionRef {
    path: String,
}

impl CollectionRef {
    pub fn as_str(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Field-equality filter applied to document payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    field: String,
    value: Value,
}

impl Filter {
    pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether a document payload satisfies this filter.
    pub fn matches(&self, data: &Value) -> bool {
        data.get(&self.field) == Some(&self.value)
    }
}

/// One stored record: store-assigned id plus JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub data: Value,
}

/// Result of a conditional batch create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// No document matched the guard; the whole batch was written.
    Committed { created: usize },
    /// Matching documents already existed; nothing was written.
    Skipped { existing: usize },
}

/// Live feed of full collection snapshots.
///
/// The first `recv` returns the snapshot current at subscribe time;
/// each later `recv` waits for a change and returns the freshest state,
/// coalescing over any intermediate versions missed in between. A
/// consumer therefore always observes the latest full collection, never
/// an incremental diff. Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    rx: watch::Receiver<Vec<Document>>,
    primed: bool,
}

impl Subscription {
    pub(crate) fn new(rx: watch::Receiver<Vec<Document>>) -> Self {
        Self { rx, primed: false }
    }

    /// Next snapshot delivery.
    ///
    /// Returns [`StoreError::SubscriptionClosed`] once the store side of
    /// the channel is gone, so a torn-down feed is distinguishable from
    /// an ordinary (possibly empty) delivery.
    pub async fn recv(&mut self) -> Result<Vec<Document>, StoreError> {
        if !self.primed {
            self.primed = true;
            return Ok(self.rx.borrow_and_update().clone());
        }
        self.rx
            .changed()
            .await
            .map_err(|_| StoreError::SubscriptionClosed)?;
        Ok(self.rx.borrow_and_update().clone())
    }
}

/// Backend-neutral contract for per-user document collections.
///
/// Queries and snapshots list documents in stable creation order.
/// Writes become visible to subscribers only through a fresh snapshot
/// delivery; callers make no optimistic assumptions about local state.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Opens a live subscription on a collection, optionally filtered.
    async fn subscribe(
        &self,
        collection: &CollectionRef,
        filter: Option<Filter>,
    ) -> Result<Subscription, StoreError>;

    /// One-shot query of matching documents.
    async fn list(
        &self,
        collection: &CollectionRef,
        filter: Option<Filter>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Fetches a single document, `None` if absent.
    async fn get(
        &self,
        collection: &CollectionRef,
        id: &DocId,
    ) -> Result<Option<Document>, StoreError>;

    /// Creates one document and returns its store-assigned id.
    async fn create(&self, collection: &CollectionRef, data: Value) -> Result<DocId, StoreError>;

    /// Replaces the full payload of an existing document.
    async fn update(
        &self,
        collection: &CollectionRef,
        id: &DocId,
        data: Value,
    ) -> Result<(), StoreError>;

    /// Deletes one document.
    async fn delete(&self, collection: &CollectionRef, id: &DocId) -> Result<(), StoreError>;

    /// Creates several documents atomically: either every payload is
    /// written or none is, so a partial failure never half-populates a
    /// collection.
    async fn create_many(
        &self,
        collection: &CollectionRef,
        docs: Vec<Value>,
    ) -> Result<Vec<DocId>, StoreError>;

    /// Atomic check-and-create: commits the batch only if no document
    /// matches `guard` at commit time. The emptiness check and the
    /// writes happen under one transaction, so two racing callers
    /// cannot both commit.
    async fn create_many_if_absent(
        &self,
        collection: &CollectionRef,
        guard: Filter,
        docs: Vec<Value>,
    ) -> Result<BatchOutcome, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scope_renders_ownership_path() {
        let scope = Scope::new("default-habit-tracker", UserId::new("anon-42"));
        let habits = scope.collection("habits");
        assert_eq!(
            habits.as_str(),
            "artifacts/default-habit-tracker/users/anon-42/habits"
        );
    }

    #[test]
    fn test_scopes_with_different_users_do_not_collide() {
        let a = Scope::new("app", UserId::new("user-a")).collection("habits");
        let b = Scope::new("app", UserId::new("user-b")).collection("habits");
        assert_ne!(a, b);
    }

    #[test]
    fn test_filter_matches_on_field_equality() {
        let filter = Filter::field_eq("week", "2025-7-18");
        assert!(filter.matches(&json!({ "week": "2025-7-18", "name": "run" })));
        assert!(!filter.matches(&json!({ "week": "2025-7-25", "name": "run" })));
        assert!(!filter.matches(&json!({ "name": "run" })));
    }

    #[test]
    fn test_filter_distinguishes_value_types() {
        let filter = Filter::field_eq("completed", true);
        assert!(filter.matches(&json!({ "completed": true })));
        assert!(!filter.matches(&json!({ "completed": "true" })));
    }
}
