//! Quote cache abstraction

use async_trait::async_trait;
use std::time::Duration;

/// Key-value store for quotes with per-entry TTL.
///
/// Values are decimal-formatted strings so prices round-trip without
/// binary float loss. Implementations must treat their own I/O failures
/// as a miss (`get` returns `None`, `put` drops the write) so a broken
/// cache degrades to always calling the provider.
#[async_trait]
pub trait QuoteCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    async fn contains(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    /// Stores `value` under `key`. An entry with `ttl` expires after that
    /// duration; `None` keeps it until removed.
    async fn put(&self, key: &str, value: String, ttl: Option<Duration>);

    async fn remove(&self, key: &str);

    async fn clear(&self);
}
