//! Shared bootstrap for CLI commands.
//!
//! Every data command resolves the same chain before touching the
//! board: configuration, a store backend, and a signed-in identity.
//! [`AppContext::connect`] runs that chain once; scoped reads and
//! writes are impossible until it returns, so a failed sign-in never
//! shows a board.

use std::error::Error;
use std::sync::Arc;

use tracing::debug;
use weekboard_core::{
    config, Config, DocumentStore, HabitsPanel, LocalIdentity, MemoryStore, PrioritiesPanel,
    Scope, Session, SqliteStore, StoreBackend, ValidationError, WeekId,
};

pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub session: Session,
    pub scope: Scope,
}

impl AppContext {
    /// Load config, open the configured store, and establish the
    /// session identity.
    pub async fn connect() -> Result<Self, Box<dyn Error>> {
        let config = Config::load()?;

        let store: Arc<dyn DocumentStore> = match config.store {
            StoreBackend::Sqlite => {
                let path = config::data_dir()?.join("store.db");
                Arc::new(SqliteStore::open(&path)?)
            }
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };

        let identity = LocalIdentity::new(config::data_dir()?);
        let session = Session::establish(&identity, config.auth_token.as_deref()).await?;
        debug!(user_id = %session.user_id(), app_id = %config.app_id, "connected");

        let scope = Scope::new(config.app_id.clone(), session.user_id().clone());
        Ok(Self {
            config,
            store,
            session,
            scope,
        })
    }

    pub fn priorities(&self) -> PrioritiesPanel {
        PrioritiesPanel::new(self.store.clone(), self.scope.clone())
    }

    pub fn habits(&self, week: WeekId) -> HabitsPanel {
        HabitsPanel::new(self.store.clone(), self.scope.clone(), week)
    }
}

/// The week a `--week-offset` value points at.
pub fn week_for_offset(offset: i64) -> Result<WeekId, ValidationError> {
    WeekId::current().offset(offset)
}
