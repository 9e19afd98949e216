//! Identity collaborator: the authenticated user and bearer credential.
//!
//! The sync engine never signs users in. It asks an `IdentityProvider` for
//! the current session and fails closed when none is usable.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::unix_timestamp_now;

const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Expiry (Unix seconds)
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }

    /// Whether the session carries a usable bearer credential
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.access_token.trim().is_empty() && !self.user.id.trim().is_empty() && !self.is_expired()
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session storage error: {0}")]
    SessionStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Supplies the authenticated user and bearer credential for sync calls.
pub trait IdentityProvider {
    /// Current session, or `None` when signed out
    fn current_session(&self) -> AuthResult<Option<AuthSession>>;
}

/// `IdentityProvider` backed by a persisted session.
#[derive(Debug, Clone)]
pub struct SessionIdentity<S: SessionPersistence> {
    store: S,
}

impl<S: SessionPersistence> SessionIdentity<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }
}

impl<S: SessionPersistence> IdentityProvider for SessionIdentity<S> {
    fn current_session(&self) -> AuthResult<Option<AuthSession>> {
        self.store.load_session()
    }
}

/// Process-local session store (primarily for tests).
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    session: Arc<Mutex<Option<AuthSession>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: AuthSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(Some(session))),
        }
    }
}

impl SessionPersistence for MemorySessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.clone())
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(session.clone());
        Ok(())
    }

    fn clear_session(&self) -> AuthResult<()> {
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: i64) -> AuthSession {
        AuthSession {
            access_token: "secret-access-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            expires_at,
            user: AuthUser {
                id: "user-1".to_string(),
                email: Some("writer@example.com".to_string()),
            },
        }
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let rendered = format!("{:?}", session(1_700_000_000));
        assert!(!rendered.contains("secret-access-token"));
        assert!(!rendered.contains("secret-refresh-token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn session_expiry_includes_skew() {
        let now = unix_timestamp_now();
        assert!(session(now + 30).is_expired());
        assert!(!session(now + 3600).is_expired());
        assert!(session(now + 3600).is_usable());
    }

    #[test]
    fn blank_token_is_not_usable() {
        let mut blank = session(unix_timestamp_now() + 3600);
        blank.access_token = "  ".to_string();
        assert!(!blank.is_usable());
    }

    #[test]
    fn session_identity_reads_from_store() {
        let store = MemorySessionStore::new();
        let identity = SessionIdentity::new(store.clone());
        assert!(identity.current_session().unwrap().is_none());

        store.save_session(&session(1)).unwrap();
        assert_eq!(
            identity.current_session().unwrap().map(|s| s.user.id),
            Some("user-1".to_string())
        );

        store.clear_session().unwrap();
        assert!(identity.current_session().unwrap().is_none());
    }
}
