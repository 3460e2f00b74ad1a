use std::{collections::HashMap, sync::Mutex};

/// Storage key for the persisted auth token.
pub(crate) const TOKEN_KEY: &str = "auth_token";
/// Storage key for the persisted user profile.
pub(crate) const USER_KEY: &str = "auth_user";
/// Storage key for a checkout session id awaiting verification across a
/// redirect round trip.
pub const PENDING_PAYMENT_KEY: &str = "pending_payment_session";

/// Storage key for a conversation's persisted transcript.
#[must_use]
pub fn chat_history_key(session_id: &str) -> String {
    format!("chat_history_{session_id}")
}

/// Durable string key-value storage, the seam over browser-style local
/// storage. Implementations must tolerate arbitrary persisted values; callers
/// treat unreadable values as absent.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory [`Storage`], the default and the test implementation.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().expect("storage mutex poisoned");
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().expect("storage mutex poisoned");
        entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().expect("storage mutex poisoned");
        entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove_round_trip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k"), None);
        storage.set("k", "v");
        assert_eq!(storage.get("k"), Some("v".to_string()));
        storage.set("k", "w");
        assert_eq!(storage.get("k"), Some("w".to_string()));
        storage.remove("k");
        assert_eq!(storage.get("k"), None);
    }
}
