use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::store::KeyValueStore;

const UNLOCKED_KEY: &str = "unlocked-ids";

/// Durable record of which places the user has unlocked.
///
/// The whole set is written back to the store on every new unlock, so a
/// restart right after an unlock never loses it.
pub struct UnlockLedger<K: KeyValueStore> {
    store: K,
    unlocked: RwLock<HashSet<String>>,
}

impl<K: KeyValueStore> UnlockLedger<K> {
    /// Load the persisted set from `store`. Absent or unreadable data
    /// degrades to an empty set, so a corrupted install behaves like a
    /// fresh one instead of failing.
    pub fn load(store: K) -> Self {
        let unlocked = store
            .get(UNLOCKED_KEY)
            .and_then(|raw| serde_json::from_str::<HashSet<String>>(&raw).ok())
            .unwrap_or_default();

        Self {
            store,
            unlocked: RwLock::new(unlocked),
        }
    }

    /// Whether `place_id` has been unlocked. Ids never seen are simply locked.
    pub async fn is_unlocked(&self, place_id: &str) -> bool {
        self.unlocked.read().await.contains(place_id)
    }

    /// Record `place_id` as unlocked and persist before returning.
    /// Unlocking an already-unlocked place changes nothing.
    pub async fn unlock(&self, place_id: &str) {
        let mut unlocked = self.unlocked.write().await;
        if unlocked.insert(place_id.to_string()) {
            self.persist(&unlocked);
        }
    }

    /// How many places have been unlocked so far
    pub async fn unlocked_count(&self) -> usize {
        self.unlocked.read().await.len()
    }

    /// Clone of the full unlocked set
    pub async fn snapshot(&self) -> HashSet<String> {
        self.unlocked.read().await.clone()
    }

    fn persist(&self, unlocked: &HashSet<String>) {
        let mut ids = unlocked.iter().map(String::as_str).collect::<Vec<_>>();
        ids.sort_unstable();
        let serialized = serde_json::to_string(&ids).expect("Failed to serialize unlocked ids");
        self.store.set(UNLOCKED_KEY, serialized);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::MemoryStore;
    use tokio::test;

    #[test]
    async fn test_unlock_and_query() {
        let ledger = UnlockLedger::load(MemoryStore::default());

        assert!(!ledger.is_unlocked("museo").await);

        ledger.unlock("museo").await;

        assert!(ledger.is_unlocked("museo").await);
        assert!(!ledger.is_unlocked("choroni").await);
        assert_eq!(ledger.unlocked_count().await, 1);
    }

    #[test]
    async fn test_survives_reload() {
        let store = MemoryStore::default();

        let ledger = UnlockLedger::load(store.clone());
        ledger.unlock("museo").await;
        drop(ledger);

        let reloaded = UnlockLedger::load(store);
        assert!(reloaded.is_unlocked("museo").await);
        assert!(!reloaded.is_unlocked("choroni").await);
    }

    #[test]
    async fn test_unlock_is_idempotent() {
        let store = MemoryStore::default();
        let ledger = UnlockLedger::load(store.clone());

        ledger.unlock("museo").await;
        ledger.unlock("museo").await;

        let raw = store.get(UNLOCKED_KEY).expect("Nothing was persisted");
        let ids = serde_json::from_str::<Vec<String>>(&raw).expect("Persisted bad JSON");
        assert_eq!(ids, vec!["museo".to_string()]);
        assert_eq!(ledger.unlocked_count().await, 1);
    }

    #[test]
    async fn test_corrupt_storage_degrades_to_empty() {
        let store = MemoryStore::default();
        store.set(UNLOCKED_KEY, "{definitely not json".to_string());

        let ledger = UnlockLedger::load(store);

        assert!(!ledger.is_unlocked("museo").await);
        assert_eq!(ledger.unlocked_count().await, 0);
    }

    #[test]
    async fn test_snapshot() {
        let ledger = UnlockLedger::load(MemoryStore::default());

        ledger.unlock("museo").await;
        ledger.unlock("choroni").await;

        let snapshot = ledger.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains("museo"));
        assert!(snapshot.contains("choroni"));
    }
}
