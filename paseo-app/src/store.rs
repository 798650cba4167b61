use paseo_logic::KeyValueStore;
use serde_json::Value;
use tauri::AppHandle;
use tauri_plugin_store::StoreExt;

const STORE_NAME: &str = "paseo";

/// [KeyValueStore] over the store plugin, one document holds every durable
/// key (unlocks, places, preferences)
#[derive(Clone)]
pub struct TauriKeyValueStore(AppHandle);

impl TauriKeyValueStore {
    pub fn new(app: AppHandle) -> Self {
        Self(app)
    }
}

impl KeyValueStore for TauriKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        let store = self.0.store(STORE_NAME).expect("Couldn't Create Store");

        let value = store
            .get(key)
            .and_then(|v| v.as_str().map(str::to_string));

        store.close_resource();

        value
    }

    fn set(&self, key: &str, value: String) {
        let store = self.0.store(STORE_NAME).expect("Couldn't create store");

        store.set(key, Value::String(value));
    }
}
