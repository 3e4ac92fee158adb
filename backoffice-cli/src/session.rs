//! Session token persisted between runs.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use backoffice_lib::auth::AccessToken;
use backoffice_lib::auth::TokenProvider;
use backoffice_lib::error::AuthError;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// What `session.json` holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// File-backed bearer token.
///
/// Also a [`TokenProvider`]: the file is read on every request, so a
/// `logout` in another shell takes effect immediately.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored session, if any.
    pub fn load(&self) -> Result<Option<Session>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AuthError::Corrupt(format!("{}: {}", self.path.display(), e)))
    }

    /// Stores a token, replacing any previous one.
    pub fn save(
        &self,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Session, AuthError> {
        let token = token.trim();
        if token.is_empty() || token.chars().any(|c| c.is_control() || c == ' ') {
            return Err(AuthError::InvalidToken);
        }

        let session = Session {
            token: token.to_string(),
            saved_at: Utc::now(),
            expires_at,
        };
        let json = serde_json::to_string_pretty(&session)
            .map_err(|e| AuthError::Corrupt(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        fs::write(&self.path, json).map_err(|source| self.io_error(source))?;
        log::info!("Session saved to {}", self.path.display());
        Ok(session)
    }

    /// Removes the stored session. Returns whether one existed.
    pub fn clear(&self) -> Result<bool, AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::info!("Session removed from {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> AuthError {
        AuthError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl TokenProvider for SessionStore {
    async fn get_token(&self) -> Result<Option<AccessToken>, AuthError> {
        let Some(session) = self.load()? else {
            log::debug!("No stored session; sending unauthenticated request");
            return Ok(None);
        };
        let token = match session.expires_at {
            Some(expires_at) => AccessToken::with_expiry(session.token, expires_at),
            None => AccessToken::new(session.token),
        };
        Ok(Some(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_session_is_none() {
        let (_dir, store) = store();
        assert!(store.load().unwrap().is_none());
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn test_save_load_clear() {
        let (_dir, store) = store();

        store.save("  abc.def  ", None).unwrap();
        assert_eq!(store.load().unwrap().unwrap().token, "abc.def");

        assert!(store.clear().unwrap());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_rejects_header_unsafe_token() {
        let (_dir, store) = store();
        assert!(matches!(store.save("a b", None), Err(AuthError::InvalidToken)));
        assert!(matches!(store.save("", None), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_corrupt_file() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.load(), Err(AuthError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_provider_reads_current_file() {
        let (_dir, store) = store();
        assert!(store.get_token().await.unwrap().is_none());

        store.save("tok", None).unwrap();
        let token = store.get_token().await.unwrap().unwrap();
        assert_eq!(token.access_token, "tok");
    }
}
