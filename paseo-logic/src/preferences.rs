use serde::{Deserialize, Serialize};

use crate::store::KeyValueStore;

const PREFS_KEY: &str = "prefs";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, specta::Type)]
/// User-tweakable display settings
pub struct AppPreferences {
    pub dark_mode: bool,
}

/// Read the stored preferences, falling back to defaults if nothing usable
/// was stored
pub fn read_preferences<K: KeyValueStore>(store: &K) -> AppPreferences {
    store
        .get(PREFS_KEY)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

pub fn write_preferences<K: KeyValueStore>(store: &K, prefs: AppPreferences) {
    let serialized = serde_json::to_string(&prefs).expect("Failed to serialize preferences");
    store.set(PREFS_KEY, serialized);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::MemoryStore;

    #[test]
    fn test_defaults_when_absent() {
        let store = MemoryStore::default();

        assert_eq!(read_preferences(&store), AppPreferences::default());
        assert!(!read_preferences(&store).dark_mode);
    }

    #[test]
    fn test_round_trip() {
        let store = MemoryStore::default();

        write_preferences(&store, AppPreferences { dark_mode: true });

        assert!(read_preferences(&store).dark_mode);
    }

    #[test]
    fn test_corrupt_storage_degrades_to_defaults() {
        let store = MemoryStore::default();
        store.set(PREFS_KEY, "7".to_string());

        assert_eq!(read_preferences(&store), AppPreferences::default());
    }
}
