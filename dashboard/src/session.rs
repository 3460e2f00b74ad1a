use crate::storage::{Storage, TOKEN_KEY, USER_KEY};
use learnhub_client::User;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The client's record of an authenticated identity and its credential.
/// A token without a user (or the reverse) never exists by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Persists the session across page loads. `load` never fails: a corrupt or
/// partial persisted value is cleared and reported as absent.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn save(&self, session: &Session) {
        self.storage.set(TOKEN_KEY, &session.token);
        if let Ok(raw) = serde_json::to_string(&session.user) {
            self.storage.set(USER_KEY, &raw);
        }
    }

    #[must_use]
    pub fn load(&self) -> Option<Session> {
        let token = self.storage.get(TOKEN_KEY);
        let raw_user = self.storage.get(USER_KEY);
        let (Some(token), Some(raw_user)) = (token, raw_user) else {
            // One half without the other is a logged-out state.
            self.clear();
            return None;
        };
        match serde_json::from_str::<User>(&raw_user) {
            Ok(user) => Some(Session { token, user }),
            Err(e) => {
                tracing::debug!(error = %e, "discarding corrupt persisted session");
                self.clear();
                None
            }
        }
    }

    pub fn clear(&self) {
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(USER_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use learnhub_client::Role;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryStorage::new()))
    }

    fn session() -> Session {
        Session {
            token: "t1".to_string(),
            user: User {
                id: "u1".to_string(),
                name: "A".to_string(),
                email: Some("a@b.com".to_string()),
                role: Role::Student,
            },
        }
    }

    #[test]
    fn save_load_round_trip() {
        let store = store();
        store.save(&session());
        assert_eq!(store.load(), Some(session()));
    }

    #[test]
    fn load_without_save_is_absent() {
        assert_eq!(store().load(), None);
    }

    #[test]
    fn corrupt_user_value_loads_as_absent() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "t1");
        storage.set(USER_KEY, "{not json");
        let store = SessionStore::new(Arc::clone(&storage) as Arc<dyn Storage>);
        assert_eq!(store.load(), None);
        // An implicit clear ran.
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[test]
    fn token_without_user_is_logged_out() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "t1");
        let store = SessionStore::new(Arc::clone(&storage) as Arc<dyn Storage>);
        assert_eq!(store.load(), None);
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[test]
    fn clear_after_save_is_absent() {
        let store = store();
        store.save(&session());
        store.clear();
        assert_eq!(store.load(), None);
    }
}
