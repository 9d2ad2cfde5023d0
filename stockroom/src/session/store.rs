//! Durable mirror of the authenticated session.

use super::storage::{Storage, StorageError};
use crate::auth::User;
use std::sync::Arc;

/// Storage key holding the bearer token
pub const TOKEN_KEY: &str = "auth_token";

/// Storage key holding the serialized identity record
pub const USER_KEY: &str = "auth_user";

/// Token and identity record, always held together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Persists the session as two storage entries, [`TOKEN_KEY`] and [`USER_KEY`].
///
/// `save` and `clear` never fail: backend errors are logged and dropped.
/// `load` never fails either; a record that cannot be read back as a whole
/// session wipes both entries and reads as empty.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store over `storage`
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Restore the persisted session, if a complete one exists
    pub fn load(&self) -> Option<Session> {
        match self.read_session() {
            Ok(Some(session)) => Some(session),
            Ok(None) => None,
            Err(StorageError::Corrupt(err)) => {
                log::warn!("Discarding corrupt persisted session: {err}");
                self.clear();
                None
            }
            Err(err) => {
                log::warn!("Failed to read persisted session: {err}");
                None
            }
        }
    }

    /// Persist `token` and `user` together
    pub fn save(&self, token: &str, user: &User) {
        let user_json = match serde_json::to_string(user) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Failed to serialize user {}: {err}", user.id);
                return;
            }
        };

        if let Err(err) = self.storage.set_item(TOKEN_KEY, token) {
            log::warn!("Failed to persist auth token: {err}");
        }
        if let Err(err) = self.storage.set_item(USER_KEY, &user_json) {
            log::warn!("Failed to persist auth user: {err}");
        }
    }

    /// Remove both entries
    pub fn clear(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove_item(key) {
                log::warn!("Failed to remove {key}: {err}");
            }
        }
    }

    /// Current bearer token, read straight from storage
    pub fn token(&self) -> Option<String> {
        match self.storage.get_item(TOKEN_KEY) {
            Ok(token) => token.filter(|token| !token.is_empty()),
            Err(err) => {
                log::warn!("Failed to read auth token: {err}");
                None
            }
        }
    }

    fn read_session(&self) -> Result<Option<Session>, StorageError> {
        let token = self.storage.get_item(TOKEN_KEY)?.filter(|t| !t.is_empty());
        let user = self.storage.get_item(USER_KEY)?.filter(|u| !u.is_empty());

        match (token, user) {
            (Some(token), Some(user_json)) => {
                let user: User = serde_json::from_str(&user_json)?;
                Ok(Some(Session { token, user }))
            }
            (None, None) => Ok(None),
            _ => {
                // Half a session is never restored; drop the orphan entry.
                log::warn!("Persisted session is incomplete, clearing it");
                self.clear();
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::storage::{FileStorage, MemoryStorage};
    use chrono::{TimeZone, Utc};

    fn user(id: i64) -> User {
        User {
            id,
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: format!("user{id}@example.com"),
            roles: Vec::new(),
            department: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        }
    }

    fn memory_store() -> (SessionStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (SessionStore::new(storage.clone()), storage)
    }

    #[test]
    fn test_load_after_save() {
        let (store, _) = memory_store();
        store.save("tok-1", &user(1));

        let session = store.load().unwrap();
        assert_eq!(session.token, "tok-1");
        assert_eq!(session.user, user(1));
        assert_eq!(store.token().as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_load_after_clear() {
        let (store, storage) = memory_store();
        store.save("tok-1", &user(1));
        store.clear();

        assert!(store.load().is_none());
        assert!(store.token().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_save_replaces_whole_record() {
        let (store, _) = memory_store();
        store.save("tok-1", &user(1));
        store.save("tok-2", &user(2));

        let session = store.load().unwrap();
        assert_eq!(session.token, "tok-2");
        assert_eq!(session.user.id, 2);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (store, _) = memory_store();
        store.clear();
        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_corrupt_user_is_wiped() {
        let (store, storage) = memory_store();
        storage.set_item(TOKEN_KEY, "tok").unwrap();
        storage.set_item(USER_KEY, "not json at all").unwrap();

        assert!(store.load().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_wrong_shape_user_is_wiped() {
        let (store, storage) = memory_store();
        storage.set_item(TOKEN_KEY, "tok").unwrap();
        storage.set_item(USER_KEY, r#"{"id": "seven"}"#).unwrap();

        assert!(store.load().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_orphan_token_is_wiped() {
        let (store, storage) = memory_store();
        storage.set_item(TOKEN_KEY, "tok").unwrap();

        assert!(store.load().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_empty_token_reads_as_absent() {
        let (store, storage) = memory_store();
        storage.set_item(TOKEN_KEY, "").unwrap();
        assert!(store.token().is_none());
    }

    #[test]
    fn test_file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let first = SessionStore::new(Arc::new(FileStorage::new(dir.path())));
        first.save("durable", &user(3));

        let reopened = SessionStore::new(Arc::new(FileStorage::new(dir.path())));
        let session = reopened.load().unwrap();
        assert_eq!(session.token, "durable");
        assert_eq!(session.user.id, 3);
    }
}
