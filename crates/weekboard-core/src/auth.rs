//! Session identity.
//!
//! Every query and mutation runs under a per-user scope, so nothing can
//! touch the store until a stable [`UserId`] resolves. Resolution goes
//! through an [`IdentityProvider`]:
//! - with a configured session token, the token alone determines the
//!   identity (same token, same user, on any machine)
//! - without one, an anonymous identity is minted once and persisted,
//!   so an anonymous user keeps their records across runs
//!
//! A rejected token never falls back to anonymous sign-in; that would
//! silently open a different (empty) user scope instead of the one the
//! token was meant to unlock.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::AuthError;

const USER_ID_FILE: &str = "user_id.txt";
const ANON_PREFIX: &str = "anon-";
const TOKEN_PREFIX: &str = "token-";

/// Stable per-user identifier all record scoping hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of user identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves the identity carried by a pre-issued session token.
    async fn sign_in_with_token(&self, token: &str) -> Result<UserId, AuthError>;

    /// Resolves (minting if necessary) an anonymous identity.
    async fn sign_in_anonymously(&self) -> Result<UserId, AuthError>;
}

/// Identity provider backed by local state.
///
/// Anonymous identities are `anon-<uuid>`, minted on first use and
/// persisted to `user_id.txt` under the data directory. Token
/// identities are derived from the token bytes (`token-` plus a SHA-256
/// digest prefix), so the same token resolves to the same user without
/// anything being stored.
pub struct LocalIdentity {
    data_dir: PathBuf,
}

impl LocalIdentity {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn io_err(&self, path: &Path, source: std::io::Error) -> AuthError {
        AuthError::IdentityFile {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn sign_in_with_token(&self, token: &str) -> Result<UserId, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::TokenRejected("token is empty".to_string()));
        }
        let digest = Sha256::digest(token.as_bytes());
        let id = format!("{}{}", TOKEN_PREFIX, &hex::encode(digest)[..32]);
        Ok(UserId::new(id))
    }

    async fn sign_in_anonymously(&self) -> Result<UserId, AuthError> {
        let id_path = self.data_dir.join(USER_ID_FILE);

        if id_path.exists() {
            let content = fs::read_to_string(&id_path).map_err(|e| self.io_err(&id_path, e))?;
            let user_id = content.trim().to_string();
            if user_id.starts_with(ANON_PREFIX) {
                return Ok(UserId::new(user_id));
            }
            return Err(AuthError::InvalidIdentity(user_id));
        }

        let user_id = format!("{}{}", ANON_PREFIX, Uuid::new_v4());

        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir).map_err(|e| self.io_err(&self.data_dir, e))?;
        }
        let mut file = fs::File::create(&id_path).map_err(|e| self.io_err(&id_path, e))?;
        writeln!(file, "{}", user_id).map_err(|e| self.io_err(&id_path, e))?;

        info!(user_id = %user_id, "minted anonymous identity");
        Ok(UserId::new(user_id))
    }
}

/// A resolved user session.
///
/// All scoped queries are unusable until this exists; the CLI shows its
/// connecting notice exactly while `establish` is in flight.
#[derive(Debug, Clone)]
pub struct Session {
    user_id: UserId,
}

impl Session {
    /// Resolves the session identity: token sign-in when a token is
    /// configured, anonymous sign-in otherwise. A token failure leaves
    /// the session unresolved (the error propagates; there is no
    /// anonymous fallback and no retry loop).
    pub async fn establish(
        provider: &dyn IdentityProvider,
        token: Option<&str>,
    ) -> Result<Self, AuthError> {
        let user_id = match token {
            Some(token) => match provider.sign_in_with_token(token).await {
                Ok(user_id) => user_id,
                Err(e) => {
                    error!(error = %e, "token sign-in failed; session unresolved");
                    return Err(e);
                }
            },
            None => provider.sign_in_anonymously().await?,
        };
        info!(user_id = %user_id, "session resolved");
        Ok(Self { user_id })
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}
