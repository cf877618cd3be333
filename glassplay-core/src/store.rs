//! Host-wired persistence collaborator.
//!
//! The engine never owns storage: the host injects a [`KeyValueStore`]
//! implementation (browser localStorage, a file, a database row) and the
//! player uses it to remember volume, playlist index, and playback position
//! according to the `remember_*` configuration flags.

/// Namespace prefix for every key the engine writes.
pub const STORE_PREFIX: &str = "glassplay:";

/// Keys used by the player.
pub mod keys {
    /// Last set volume, stored as a decimal float.
    pub const VOLUME: &str = "glassplay:volume";
    /// Last current playlist index, stored as a decimal integer.
    pub const INDEX: &str = "glassplay:index";
    /// Last playback position in milliseconds, stored as a decimal integer.
    pub const POSITION: &str = "glassplay:position";
}

/// Minimal keyed store contract. Implementations must be infallible from the
/// engine's point of view; persistence failures are the host's concern.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::KeyValueStore;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct MemoryStore {
        entries: Mutex<HashMap<String, String>>,
    }

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> Option<String> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        fn set(&self, key: &str, value: &str) {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemoryStore;
    use super::*;

    #[test]
    fn test_keys_are_namespaced() {
        assert!(keys::VOLUME.starts_with(STORE_PREFIX));
        assert!(keys::INDEX.starts_with(STORE_PREFIX));
        assert!(keys::POSITION.starts_with(STORE_PREFIX));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::default();
        assert!(store.get(keys::VOLUME).is_none());
        store.set(keys::VOLUME, "0.5");
        assert_eq!(store.get(keys::VOLUME).as_deref(), Some("0.5"));
    }
}
