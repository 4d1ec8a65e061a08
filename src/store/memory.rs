use crate::core::cache::QuoteCache;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct CacheValue {
    value: String,
    expires_at: Option<Instant>,
}

/// In-memory quote store. Used in tests and as the degraded fallback when
/// the disk store cannot be opened.
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, CacheValue>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteCache for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        let cache = self.inner.lock().await;
        if let Some(entry) = cache.get(key) {
            if let Some(expiry) = entry.expires_at {
                if expiry < Instant::now() {
                    debug!("Cache entry expired for key: {key}");
                    return None;
                }
            }
            debug!("Cache HIT for key: {key}");
            return Some(entry.value.clone());
        }
        debug!("Cache MISS for key: {key}");
        None
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) {
        let expires_at = ttl.map(|duration| Instant::now() + duration);
        let cache_value = CacheValue { value, expires_at };

        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {key}");
        cache.insert(key.to_string(), cache_value);
    }

    async fn remove(&self, key: &str) {
        let mut cache = self.inner.lock().await;
        cache.remove(key);
        debug!("Cache REMOVE for key: {key}");
    }

    async fn clear(&self) {
        let mut cache = self.inner.lock().await;
        cache.clear();
        debug!("Cache CLEAR");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_cache_get_put() {
        let cache = MemoryStore::new();

        // Initially, cache is empty
        assert!(cache.get("key1").await.is_none());

        // Put a value without TTL
        cache.put("key1", "95.10".to_string(), None).await;

        // Get the value
        assert_eq!(cache.get("key1").await.as_deref(), Some("95.10"));
        assert!(cache.contains("key1").await);

        // Get a non-existent key
        assert!(cache.get("key2").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_ttl_expiration() {
        let cache = MemoryStore::new();

        // Put value with 10ms TTL
        cache
            .put("key1", "95.10".to_string(), Some(Duration::from_millis(10)))
            .await;
        assert_eq!(cache.get("key1").await.as_deref(), Some("95.10"));

        // Wait for TTL expiration
        sleep(Duration::from_millis(20)).await;
        assert!(cache.get("key1").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_remove() {
        let cache = MemoryStore::new();

        cache.put("key1", "1".to_string(), None).await;
        assert!(cache.get("key1").await.is_some());

        cache.remove("key1").await;
        assert!(cache.get("key1").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_clear() {
        let cache = MemoryStore::new();

        cache.put("key1", "1".to_string(), None).await;
        cache.put("key2", "2".to_string(), None).await;

        cache.clear().await;

        assert!(cache.get("key1").await.is_none());
        assert!(cache.get("key2").await.is_none());
    }
}
