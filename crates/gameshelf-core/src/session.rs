// ── Session store ──
//
// The single source of truth for "who is signed in". Every mutation goes
// through `login`/`logout`, which update the in-memory state, notify
// subscribers, and write the durable copy. The store doubles as the
// `TokenProvider` for outgoing requests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gameshelf_api::{TokenProvider, UserProfile};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::CoreError;

/// Name of the durable session record.
pub const SESSION_KEY: &str = "auth-storage";

/// Current authentication state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub is_logged_in: bool,
    pub token: Option<SecretString>,
    pub user: Option<UserProfile>,
}

/// On-disk shape of a [`Session`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default)]
    pub is_logged_in: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

impl From<&Session> for PersistedSession {
    fn from(session: &Session) -> Self {
        Self {
            is_logged_in: session.is_logged_in,
            token: session.token.as_ref().map(|t| t.expose_secret().to_owned()),
            user: session.user.clone(),
        }
    }
}

impl From<PersistedSession> for Session {
    fn from(persisted: PersistedSession) -> Self {
        let token = persisted.token.filter(|t| !t.is_empty()).map(SecretString::from);
        Self {
            // A flag without a token is not a usable session.
            is_logged_in: persisted.is_logged_in && token.is_some(),
            token,
            user: persisted.user,
        }
    }
}

// ── Storage backends ────────────────────────────────────────────────

/// Durable home for the session record.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<PersistedSession>, CoreError>;
    fn save(&self, session: &PersistedSession) -> Result<(), CoreError>;
}

/// JSON file named `auth-storage.json` in a state directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{SESSION_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<PersistedSession>, CoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(&self.path, &e)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| storage_error(&self.path, &e))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| storage_error(parent, &e))?;
        }
        let json = serde_json::to_string_pretty(session).map_err(|e| storage_error(&self.path, &e))?;
        std::fs::write(&self.path, json).map_err(|e| storage_error(&self.path, &e))
    }
}

fn storage_error(path: &Path, err: &dyn std::fmt::Display) -> CoreError {
    CoreError::Storage {
        message: format!("{}: {err}", path.display()),
    }
}

/// Process-local storage for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: std::sync::Mutex<Option<PersistedSession>>,
}

impl MemoryStorage {
    pub fn with(session: PersistedSession) -> Self {
        Self {
            slot: std::sync::Mutex::new(Some(session)),
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<PersistedSession>, CoreError> {
        self.slot
            .lock()
            .map(|slot| slot.clone())
            .map_err(|e| CoreError::Internal(e.to_string()))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), CoreError> {
        let mut slot = self.slot.lock().map_err(|e| CoreError::Internal(e.to_string()))?;
        *slot = Some(session.clone());
        Ok(())
    }
}

// ── SessionStore ─────────────────────────────────────────────────────

/// Reactive session state backed by a [`SessionStorage`].
pub struct SessionStore {
    state: watch::Sender<Session>,
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    /// Rehydrate from `storage`. An unreadable record starts logged out.
    pub fn open(storage: Arc<dyn SessionStorage>) -> Self {
        let initial = match storage.load() {
            Ok(Some(persisted)) => Session::from(persisted),
            Ok(None) => Session::default(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable session record");
                Session::default()
            }
        };
        debug!(logged_in = initial.is_logged_in, "session rehydrated");
        let (state, _) = watch::channel(initial);
        Self { state, storage }
    }

    /// Store a fresh session and persist it.
    pub fn login(&self, token: SecretString, user: Option<UserProfile>) -> Result<(), CoreError> {
        self.state.send_replace(Session {
            is_logged_in: true,
            token: Some(token),
            user,
        });
        self.persist()
    }

    /// Clear the session. Calling it while logged out is a no-op apart
    /// from rewriting the empty record.
    pub fn logout(&self) -> Result<(), CoreError> {
        self.state.send_replace(Session::default());
        self.persist()
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_logged_in
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.borrow().user.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    fn persist(&self) -> Result<(), CoreError> {
        let record = PersistedSession::from(&*self.state.borrow());
        self.storage.save(&record)
    }
}

impl TokenProvider for SessionStore {
    fn bearer_token(&self) -> Option<SecretString> {
        self.state.borrow().token.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn profile() -> UserProfile {
        UserProfile {
            email: Some("test@example.com".into()),
            ..UserProfile::default()
        }
    }

    #[test]
    fn login_notifies_and_persists() {
        let storage = Arc::new(MemoryStorage::default());
        let store = SessionStore::open(storage.clone());
        let mut rx = store.subscribe();

        store
            .login(SecretString::from("fake-jwt-token".to_owned()), Some(profile()))
            .unwrap();

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_logged_in);
        assert_eq!(
            store.bearer_token().map(|t| t.expose_secret().to_owned()),
            Some("fake-jwt-token".to_owned())
        );

        let saved = storage.load().unwrap().unwrap();
        assert!(saved.is_logged_in);
        assert_eq!(saved.token.as_deref(), Some("fake-jwt-token"));
        assert_eq!(saved.user, Some(profile()));
    }

    #[test]
    fn logout_is_idempotent() {
        let storage = Arc::new(MemoryStorage::default());
        let store = SessionStore::open(storage.clone());
        store.login(SecretString::from("t".to_owned()), None).unwrap();

        store.logout().unwrap();
        store.logout().unwrap();

        let session = store.snapshot();
        assert!(!session.is_logged_in);
        assert!(session.token.is_none());
        assert!(session.user.is_none());
        assert_eq!(storage.load().unwrap(), Some(PersistedSession::default()));
    }

    #[test]
    fn rehydrates_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileStorage::in_dir(dir.path()));
        SessionStore::open(storage.clone())
            .login(SecretString::from("persisted".to_owned()), Some(profile()))
            .unwrap();

        let raw = std::fs::read_to_string(storage.path()).unwrap();
        assert!(raw.contains("\"isLoggedIn\": true"));

        let reopened = SessionStore::open(storage);
        assert!(reopened.is_logged_in());
        assert_eq!(reopened.user(), Some(profile()));
    }

    #[test]
    fn corrupt_file_starts_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("auth-storage.json"), "{not json").unwrap();

        let store = SessionStore::open(Arc::new(FileStorage::in_dir(dir.path())));
        assert!(!store.is_logged_in());
    }

    #[test]
    fn flag_without_token_is_logged_out() {
        let storage = MemoryStorage::with(PersistedSession {
            is_logged_in: true,
            token: None,
            user: None,
        });
        let store = SessionStore::open(Arc::new(storage));
        assert!(!store.is_logged_in());
    }
}
