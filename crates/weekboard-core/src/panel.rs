//! Panel controllers: priorities checklist and weekly habit grid.
//!
//! Each panel binds one live query to typed state and turns user
//! intents (add, toggle, delete) into store mutations. Reads flow one
//! way: store to subscription to snapshot; a mutation's effect becomes
//! visible only through the next snapshot delivery, never by local
//! optimistic bookkeeping. Every mutation returns a typed `Result` so
//! callers decide whether to surface, log, or retry a failure.
//!
//! Both panels take their store handle and scope at construction; they
//! hold no global state and any [`DocumentStore`] implementation can be
//! injected.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::carryover::{CarryOverEngine, CarryOverOutcome};
use crate::error::{CoreError, StoreError, ValidationError};
use crate::model::{self, DocId, FromDocument, Habit, NewHabit, NewPriority, Priority};
use crate::store::{CollectionRef, DocumentStore, Filter, Scope, Subscription};
use crate::week::WeekId;

/// Typed live feed over one panel's collection.
///
/// Wraps the raw document subscription and decodes every delivery. A
/// malformed document or a torn-down subscription surfaces as an error
/// instead of being dropped silently.
pub struct PanelFeed<T> {
    sub: Subscription,
    _marker: PhantomData<T>,
}

impl<T: FromDocument> PanelFeed<T> {
    fn new(sub: Subscription) -> Self {
        Self {
            sub,
            _marker: PhantomData,
        }
    }

    /// Next full snapshot: the current one on first call, then one per
    /// change, always the freshest state.
    pub async fn recv(&mut self) -> Result<Vec<T>, StoreError> {
        let docs = self.sub.recv().await?;
        docs.iter().map(T::from_document).collect()
    }
}

// ── Priorities ──────────────────────────────────────────────────────────

/// Controller for the weekly priorities checklist.
pub struct PrioritiesPanel {
    store: Arc<dyn DocumentStore>,
    scope: Scope,
}

impl PrioritiesPanel {
    pub fn new(store: Arc<dyn DocumentStore>, scope: Scope) -> Self {
        Self { store, scope }
    }

    fn collection(&self) -> CollectionRef {
        self.scope.collection(Priority::COLLECTION)
    }

    /// Live feed of all priorities for this user.
    pub async fn subscribe(&self) -> Result<PanelFeed<Priority>, CoreError> {
        let sub = self.store.subscribe(&self.collection(), None).await?;
        Ok(PanelFeed::new(sub))
    }

    /// One-shot listing, in creation order.
    pub async fn list(&self) -> Result<Vec<Priority>, CoreError> {
        let docs = self.store.list(&self.collection(), None).await?;
        let priorities = docs
            .iter()
            .map(Priority::from_document)
            .collect::<Result<_, _>>()?;
        Ok(priorities)
    }

    /// Adds a priority. The text is trimmed and must be non-empty;
    /// `completed` starts false.
    pub async fn add(&self, text: &str) -> Result<DocId, CoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "text".to_string(),
            }
            .into());
        }
        let id = self
            .store
            .create(&self.collection(), NewPriority::new(text).to_data())
            .await?;
        Ok(id)
    }

    /// Marks a priority done or not done, persisting the full payload.
    pub async fn set_completed(&self, id: &DocId, completed: bool) -> Result<(), CoreError> {
        let collection = self.collection();
        let doc = self
            .store
            .get(&collection, id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.as_str().to_string(),
                id: id.to_string(),
            })?;
        let mut priority = Priority::from_document(&doc)?;
        priority.completed = completed;
        self.store
            .update(&collection, id, priority.to_data())
            .await?;
        Ok(())
    }

    /// Deletes one priority.
    pub async fn remove(&self, id: &DocId) -> Result<(), CoreError> {
        self.store.delete(&self.collection(), id).await?;
        Ok(())
    }
}

// ── Habits ──────────────────────────────────────────────────────────────

/// Controller for one week's habit grid.
///
/// The panel is pinned to a single week; navigating to another week
/// means constructing a panel for that week (same injected handles).
pub struct HabitsPanel {
    store: Arc<dyn DocumentStore>,
    scope: Scope,
    week: WeekId,
    carry: CarryOverEngine,
}

impl HabitsPanel {
    pub fn new(store: Arc<dyn DocumentStore>, scope: Scope, week: WeekId) -> Self {
        let carry = CarryOverEngine::new(store.clone(), scope.clone());
        Self {
            store,
            scope,
            week,
            carry,
        }
    }

    pub fn week(&self) -> WeekId {
        self.week
    }

    /// Same handles, different active week.
    pub fn for_week(&self, week: WeekId) -> Self {
        Self::new(self.store.clone(), self.scope.clone(), week)
    }

    fn collection(&self) -> CollectionRef {
        self.scope.collection(Habit::COLLECTION)
    }

    fn week_filter(&self) -> Filter {
        Filter::field_eq("week", self.week.to_string())
    }

    /// Runs the carry-over check for this panel's week. Invoked once
    /// whenever the active week changes, including on first load.
    pub async fn activate(&self) -> Result<CarryOverOutcome, CoreError> {
        let outcome = self
            .carry
            .ensure_week_populated(self.week, self.week.prev())
            .await?;
        Ok(outcome)
    }

    /// Live feed of this week's habits.
    pub async fn subscribe(&self) -> Result<PanelFeed<Habit>, CoreError> {
        let sub = self
            .store
            .subscribe(&self.collection(), Some(self.week_filter()))
            .await?;
        Ok(PanelFeed::new(sub))
    }

    /// One-shot listing of this week's habits, in creation order.
    pub async fn list(&self) -> Result<Vec<Habit>, CoreError> {
        let docs = self
            .store
            .list(&self.collection(), Some(self.week_filter()))
            .await?;
        let habits = docs
            .iter()
            .map(Habit::from_document)
            .collect::<Result<_, _>>()?;
        Ok(habits)
    }

    /// Adds a habit to this week with no days checked. The name is
    /// trimmed and must be non-empty.
    pub async fn add(&self, name: &str) -> Result<DocId, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "name".to_string(),
            }
            .into());
        }
        let id = self
            .store
            .create(
                &self.collection(),
                NewHabit::fresh(name, self.week).to_data(),
            )
            .await?;
        Ok(id)
    }

    /// Flips one day of a habit's progress.
    ///
    /// Reads the current sequence, toggles the given index, and
    /// persists the full replaced sequence rather than a field patch.
    /// Two sessions toggling different days of the same habit can still
    /// clobber each other: the later full-sequence write wins.
    pub async fn toggle_day(&self, id: &DocId, day: usize) -> Result<(), CoreError> {
        let collection = self.collection();
        let doc = self
            .store
            .get(&collection, id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.as_str().to_string(),
                id: id.to_string(),
            })?;
        let habit = Habit::from_document(&doc)?;
        let progress = model::toggle_day(habit.progress, day)?;
        let updated = Habit { progress, ..habit };
        self.store.update(&collection, id, updated.to_data()).await?;
        Ok(())
    }

    /// Deletes this week's record of a habit. Records of other weeks
    /// (including same-named ones) are untouched.
    pub async fn remove(&self, id: &DocId) -> Result<(), CoreError> {
        self.store.delete(&self.collection(), id).await?;
        Ok(())
    }
}
