//! Persistent key-value storage supplied by the embedding application.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Minimal string key-value store (browser `localStorage`, a settings file,
/// an OS keychain wrapper, ...).
///
/// # Threading
/// All methods are synchronous. Implementations backed by slow I/O will block
/// the calling task.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = MemoryKeyValueStore::new();
        assert!(store.get("k").is_none());
        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.set("k", "v2");
        assert_eq!(store.get("k").as_deref(), Some("v2"));
        store.remove("k");
        assert!(store.get("k").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn remove_missing_is_noop() {
        let store = MemoryKeyValueStore::new();
        store.remove("absent");
        assert_eq!(store.len(), 0);
    }
}
