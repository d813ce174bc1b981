use crate::error::PersistenceError;
use async_trait::async_trait;

/// Optional key-value persistence for position state.
///
/// Keys follow `{namespace}:position:{symbol}`; values are JSON-serialized
/// positions. The store is a side channel only: failures must be treated
/// as non-fatal by callers.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Upsert a value under a key.
    async fn put(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Return all (key, value) pairs whose key starts with `prefix`.
    async fn scan(&self, prefix: &str) -> Result<Vec<(String, String)>, PersistenceError>;
}
