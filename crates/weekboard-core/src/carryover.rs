//! Week rollover: carrying habits forward into a new week.
//!
//! When a week becomes active and has no habit records yet, the
//! previous week's habits are cloned into it with progress reset, so
//! recurring habits never have to be re-entered. The check runs every
//! time the active week changes (including first load and navigation);
//! the emptiness check doubles as the retry gate after a failed commit.
//!
//! Two sessions can both observe an empty week and try to populate it.
//! The commit therefore goes through the store's conditional batch,
//! which re-checks emptiness inside the write transaction: one session
//! commits, the other comes back with [`CarryOverOutcome::LostRace`]
//! and writes nothing.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::model::{FromDocument, Habit, NewHabit};
use crate::store::{BatchOutcome, DocumentStore, Filter, Scope};
use crate::week::WeekId;

/// What one rollover invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarryOverOutcome {
    /// The week already had records (prior carry-over or direct adds).
    AlreadyPopulated { existing: usize },
    /// The previous week had nothing to clone; the week starts empty.
    NothingToCarry,
    /// Clones of the previous week's habits were committed.
    Carried { count: usize },
    /// Another session populated the week between check and commit.
    LostRace { existing: usize },
}

/// Builds the clones that would populate `week` from the previous
/// week's records: same names, new week, progress reset to all-false.
///
/// Pure planning step; input order is preserved so the new week lists
/// habits the way the old week did.
pub fn plan_carry_over(previous: &[Habit], week: WeekId) -> Vec<NewHabit> {
    previous
        .iter()
        .map(|habit| NewHabit::fresh(habit.name.clone(), week))
        .collect()
}

/// Runs the rollover check against one user's habit collection.
pub struct CarryOverEngine {
    store: Arc<dyn DocumentStore>,
    scope: Scope,
}

impl CarryOverEngine {
    pub fn new(store: Arc<dyn DocumentStore>, scope: Scope) -> Self {
        Self { store, scope }
    }

    /// Ensures `current` has habit records, cloning `previous`'s records
    /// into it when it is empty.
    ///
    /// Side effects are additive only: records of `previous` (and every
    /// other week) are never mutated or deleted. On store failure the
    /// week stays empty and the next invocation retries naturally.
    pub async fn ensure_week_populated(
        &self,
        current: WeekId,
        previous: WeekId,
    ) -> Result<CarryOverOutcome, StoreError> {
        let collection = self.scope.collection(Habit::COLLECTION);
        let current_filter = Filter::field_eq("week", current.to_string());

        let existing = self
            .store
            .list(&collection, Some(current_filter.clone()))
            .await?;
        if !existing.is_empty() {
            debug!(week = %current, existing = existing.len(), "week already populated");
            return Ok(CarryOverOutcome::AlreadyPopulated {
                existing: existing.len(),
            });
        }

        let prior_docs = self
            .store
            .list(
                &collection,
                Some(Filter::field_eq("week", previous.to_string())),
            )
            .await?;
        if prior_docs.is_empty() {
            debug!(week = %current, "no previous-week habits to carry");
            return Ok(CarryOverOutcome::NothingToCarry);
        }

        let mut prior = Vec::with_capacity(prior_docs.len());
        for doc in &prior_docs {
            prior.push(Habit::from_document(doc)?);
        }

        let payloads = plan_carry_over(&prior, current)
            .iter()
            .map(NewHabit::to_data)
            .collect();
        match self
            .store
            .create_many_if_absent(&collection, current_filter, payloads)
            .await?
        {
            BatchOutcome::Committed { created } => {
                info!(week = %current, count = created, "carried habits into new week");
                Ok(CarryOverOutcome::Carried { count: created })
            }
            BatchOutcome::Skipped { existing } => {
                warn!(week = %current, existing, "carry-over lost to a concurrent session");
                Ok(CarryOverOutcome::LostRace { existing })
            }
        }
    }
}
