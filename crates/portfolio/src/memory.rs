use async_trait::async_trait;
use helm_ports::{PersistenceError, StateStore};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-memory state store.
///
/// Default persistence adapter and the test double for anything that needs
/// a `StateStore`. A BTreeMap keeps `scan` output deterministic.
#[derive(Default)]
pub struct MemoryStateStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries (test helper)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn put(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, String)>, PersistenceError> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
