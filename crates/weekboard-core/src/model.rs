//! Record types for the two tracked collections.
//!
//! A [`Priority`] is a one-off checklist entry; a [`Habit`] is a weekly
//! recurring entry with per-day progress, partitioned by [`WeekId`].
//! Ids are assigned by the store on creation, so each type comes with a
//! `New*` payload form for creation and a hydrated form carrying the id.
//! Stored payloads never embed the id; [`FromDocument`] rehydrates a
//! typed record from a raw store document.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{StoreError, ValidationError};
use crate::store::Document;
use crate::week::{WeekId, DAYS_IN_WEEK};

/// Store-assigned document identifier, opaque to callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocId(String);

impl DocId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Per-day completion flags for one week, Monday-first.
pub type Progress = [bool; DAYS_IN_WEEK];

/// Flips the flag at `day`, leaving every other day untouched.
///
/// The whole sequence is returned because habit updates persist the full
/// replaced array rather than a single-field patch.
pub fn toggle_day(progress: Progress, day: usize) -> Result<Progress, ValidationError> {
    if day >= DAYS_IN_WEEK {
        return Err(ValidationError::OutOfBounds {
            collection: "progress".to_string(),
            index: day,
            len: DAYS_IN_WEEK,
        });
    }
    let mut next = progress;
    next[day] = !next[day];
    Ok(next)
}

/// Rehydrates a typed record from a raw store document.
pub trait FromDocument: Sized {
    fn from_document(doc: &Document) -> Result<Self, StoreError>;
}

// ── Priorities ──────────────────────────────────────────────────────────

/// One entry on the weekly priorities checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Priority {
    pub id: DocId,
    pub text: String,
    pub completed: bool,
}

/// Creation payload for a priority; `completed` starts false.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPriority {
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct PriorityData {
    text: String,
    #[serde(default)]
    completed: bool,
}

impl Priority {
    pub const COLLECTION: &'static str = "priorities";

    /// Stored payload for this record (no id; the id is the document key).
    pub fn to_data(&self) -> Value {
        json!({ "text": self.text, "completed": self.completed })
    }
}

impl NewPriority {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn to_data(&self) -> Value {
        json!({ "text": self.text, "completed": false })
    }
}

impl FromDocument for Priority {
    fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let data: PriorityData =
            serde_json::from_value(doc.data.clone()).map_err(|e| StoreError::Decode {
                collection: Self::COLLECTION.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            id: doc.id.clone(),
            text: data.text,
            completed: data.completed,
        })
    }
}

// ── Habits ──────────────────────────────────────────────────────────────

/// One recurring habit within a single week's grid.
///
/// `week` is assigned at creation and never changes; carry-over creates
/// a fresh record for the next week instead of moving this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: DocId,
    pub name: String,
    pub week: WeekId,
    pub progress: Progress,
}

/// Creation payload for a habit.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHabit {
    pub name: String,
    pub week: WeekId,
    pub progress: Progress,
}

#[derive(Debug, Deserialize)]
struct HabitData {
    name: String,
    week: WeekId,
    progress: Progress,
}

impl Habit {
    pub const COLLECTION: &'static str = "habits";

    /// Stored payload for this record (no id).
    pub fn to_data(&self) -> Value {
        json!({ "name": self.name, "week": self.week, "progress": self.progress })
    }
}

impl NewHabit {
    /// A habit starting this `week` with no days checked.
    pub fn fresh(name: impl Into<String>, week: WeekId) -> Self {
        Self {
            name: name.into(),
            week,
            progress: [false; DAYS_IN_WEEK],
        }
    }

    pub fn to_data(&self) -> Value {
        json!({ "name": self.name, "week": self.week, "progress": self.progress })
    }
}

impl FromDocument for Habit {
    fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let data: HabitData =
            serde_json::from_value(doc.data.clone()).map_err(|e| StoreError::Decode {
                collection: Self::COLLECTION.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            id: doc.id.clone(),
            name: data.name,
            week: data.week,
            progress: data.progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn week(y: i32, m: u32, d: u32) -> WeekId {
        WeekId::for_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn toggle_flips_only_the_given_day() {
        let start: Progress = [false; DAYS_IN_WEEK];
        let toggled = toggle_day(start, 3).unwrap();
        assert_eq!(toggled, [false, false, false, true, false, false, false]);

        let reverted = toggle_day(toggled, 3).unwrap();
        assert_eq!(reverted, start);
    }

    #[test]
    fn toggle_preserves_other_days() {
        let start = [true, false, true, false, false, true, false];
        let toggled = toggle_day(start, 1).unwrap();
        assert_eq!(toggled, [true, true, true, false, false, true, false]);
    }

    #[test]
    fn toggle_rejects_out_of_range_day() {
        let err = toggle_day([false; DAYS_IN_WEEK], 7);
        assert!(matches!(
            err,
            Err(ValidationError::OutOfBounds { index: 7, len: 7, .. })
        ));
    }

    #[test]
    fn test_priority_round_trip() {
        let doc = Document {
            id: DocId::new("p1"),
            data: json!({ "text": "ship the report", "completed": true }),
        };
        let p = Priority::from_document(&doc).unwrap();
        assert_eq!(p.text, "ship the report");
        assert!(p.completed);
        assert_eq!(p.to_data(), doc.data);
    }

    #[test]
    fn test_priority_completed_defaults_false() {
        let doc = Document {
            id: DocId::new("p1"),
            data: json!({ "text": "call dentist" }),
        };
        let p = Priority::from_document(&doc).unwrap();
        assert!(!p.completed);
    }

    #[test]
    fn test_priority_decode_failure_names_collection() {
        let doc = Document {
            id: DocId::new("p1"),
            data: json!({ "completed": true }),
        };
        match Priority::from_document(&doc) {
            Err(StoreError::Decode { collection, .. }) => {
                assert_eq!(collection, "priorities");
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_habit_round_trip() {
        let w = week(2025, 8, 18);
        let doc = Document {
            id: DocId::new("h1"),
            data: json!({
                "name": "stretch",
                "week": w.to_string(),
                "progress": [true, false, false, false, false, false, false],
            }),
        };
        let h = Habit::from_document(&doc).unwrap();
        assert_eq!(h.name, "stretch");
        assert_eq!(h.week, w);
        assert!(h.progress[0]);
        assert_eq!(h.to_data(), doc.data);
    }

    #[test]
    fn test_habit_rejects_malformed_week() {
        let doc = Document {
            id: DocId::new("h1"),
            data: json!({
                "name": "stretch",
                "week": "not-a-week",
                "progress": [false, false, false, false, false, false, false],
            }),
        };
        assert!(matches!(
            Habit::from_document(&doc),
            Err(StoreError::Decode { .. })
        ));
    }

    #[test]
    fn test_habit_rejects_short_progress() {
        let doc = Document {
            id: DocId::new("h1"),
            data: json!({
                "name": "stretch",
                "week": week(2025, 8, 18).to_string(),
                "progress": [false, false, false],
            }),
        };
        assert!(matches!(
            Habit::from_document(&doc),
            Err(StoreError::Decode { .. })
        ));
    }

    #[test]
    fn test_fresh_habit_has_no_days_checked() {
        let h = NewHabit::fresh("run", week(2025, 8, 18));
        assert_eq!(h.progress, [false; DAYS_IN_WEEK]);
    }
}
