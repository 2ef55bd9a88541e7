//! # Weekboard Core Library
//!
//! This library provides the core logic for the weekboard habit
//! tracker. It implements a CLI-first philosophy where all operations
//! are available via a standalone CLI binary, with any richer frontend
//! being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Weeks**: Monday-first week arithmetic and the week identifier
//!   every habit record is keyed by
//! - **Store**: a document store abstraction with live subscriptions,
//!   backed by SQLite (durable) or memory (volatile)
//! - **Carry-over**: the resolver that seeds an empty week from the
//!   previous week's habit list
//! - **Panels**: controllers for the priorities checklist and the
//!   weekly habit grid
//!
//! ## Key Components
//!
//! - [`WeekId`]: canonical identifier of a Monday-first week
//! - [`DocumentStore`]: storage trait every panel talks to
//! - [`CarryOverEngine`]: week population and habit carry-over
//! - [`PrioritiesPanel`] / [`HabitsPanel`]: user-facing operations
//! - [`Config`]: application configuration management

pub mod auth;
pub mod carryover;
pub mod config;
pub mod error;
pub mod model;
pub mod panel;
pub mod store;
pub mod week;

pub use auth::{IdentityProvider, LocalIdentity, Session, UserId};
pub use carryover::{CarryOverEngine, CarryOverOutcome};
pub use config::{Config, StoreBackend};
pub use error::{AuthError, ConfigError, CoreError, StoreError, ValidationError};
pub use model::{DocId, FromDocument, Habit, NewHabit, NewPriority, Priority, Progress};
pub use panel::{HabitsPanel, PanelFeed, PrioritiesPanel};
pub use store::{
    BatchOutcome, CollectionRef, Document, DocumentStore, Filter, MemoryStore, Scope, SqliteStore,
    Subscription,
};
pub use week::{week_start, WeekId, DAYS_IN_WEEK, DAY_LABELS};
