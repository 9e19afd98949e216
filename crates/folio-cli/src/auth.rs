//! CLI session persistence: one JSON file per profile under the config dir.

use std::path::{Path, PathBuf};

use folio_core::auth::{AuthError, AuthResult, AuthSession, SessionPersistence};

use crate::config_profiles::config_dir;

const SESSIONS_DIR_NAME: &str = "sessions";

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_profile(profile_name: &str) -> AuthResult<Self> {
        let dir = config_dir().map_err(AuthError::SessionStorage)?;
        Ok(Self::new(
            dir.join(SESSIONS_DIR_NAME)
                .join(format!("{profile_name}.json")),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileSessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(AuthError::Io(error)),
        }
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    fn clear_session(&self) -> AuthResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AuthError::Io(error)),
        }
    }
}

pub fn load_stored_session(profile_name: &str) -> AuthResult<Option<AuthSession>> {
    FileSessionStore::for_profile(profile_name)?.load_session()
}

pub fn clear_stored_session(profile_name: &str) -> AuthResult<()> {
    FileSessionStore::for_profile(profile_name)?.clear_session()
}

#[cfg(test)]
mod tests {
    use folio_core::auth::AuthUser;
    use pretty_assertions::assert_eq;

    use super::*;

    fn session() -> AuthSession {
        AuthSession {
            access_token: "secret-access-token".to_string(),
            refresh_token: String::new(),
            expires_at: 1_700_000_000,
            user: AuthUser {
                id: "user".to_string(),
                email: Some("writer@example.com".to_string()),
            },
        }
    }

    #[test]
    fn session_file_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("sessions").join("default.json"));

        assert_eq!(store.load_session().unwrap(), None);
        store.save_session(&session()).unwrap();
        assert_eq!(store.load_session().unwrap(), Some(session()));

        store.clear_session().unwrap();
        assert_eq!(store.load_session().unwrap(), None);
        store.clear_session().unwrap();
    }

    #[test]
    fn corrupt_session_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.json");
        std::fs::write(&path, "not json").unwrap();

        let error = FileSessionStore::new(path).load_session().unwrap_err();
        assert!(matches!(error, AuthError::Json(_)));
    }
}
