/// Durable string key-value storage backing the ledger, catalog, and
/// preferences. A write fully replaces the value stored at its key.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored at `key`, [None] if nothing was ever stored
    fn get(&self, key: &str) -> Option<String>;

    /// Replace the value at `key`
    fn set(&self, key: &str, value: String);
}
