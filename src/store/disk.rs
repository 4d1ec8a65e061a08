use crate::core::cache::QuoteCache;
use anyhow::Result;
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    value: String,
    expires_at: Option<SystemTime>,
}

/// Disk-backed quote store persisting across process runs.
///
/// The keyspace is opened once and released when the store is dropped, on
/// all exit paths. Every I/O failure is logged and treated as a cache
/// miss.
pub struct DiskStore {
    quotes: PartitionHandle,
    // Keeps the keyspace (and its journal) alive as long as the partition.
    _keyspace: Keyspace,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let keyspace = fjall::Config::new(path).open()?;
        let quotes = keyspace.open_partition("quotes", PartitionCreateOptions::default())?;
        Ok(Self {
            quotes,
            _keyspace: keyspace,
        })
    }
}

#[async_trait]
impl QuoteCache for DiskStore {
    async fn get(&self, key: &str) -> Option<String> {
        let res: Result<Option<String>> = (|| {
            if let Some(raw) = self.quotes.get(key)? {
                let entry: CacheEntry = serde_json::from_slice(&raw)?;
                if let Some(expires_at) = entry.expires_at {
                    if SystemTime::now() > expires_at {
                        debug!("Cache entry expired for key: {key}");
                        self.quotes.remove(key)?;
                        return Ok(None);
                    }
                }
                debug!("Cache HIT for key: {key}");
                return Ok(Some(entry.value));
            }
            debug!("Cache MISS for key: {key}");
            Ok(None)
        })();

        match res {
            Ok(val) => val,
            Err(e) => {
                debug!("DiskStore get error: {e}");
                None
            }
        }
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) {
        let res: Result<()> = (|| {
            let expires_at = ttl.map(|d| SystemTime::now() + d);
            let entry = CacheEntry { value, expires_at };
            self.quotes.insert(key, serde_json::to_vec(&entry)?)?;
            debug!("Cache PUT for key: {key}");
            Ok(())
        })();
        if let Err(e) = res {
            debug!("DiskStore put error: {e}");
        }
    }

    async fn remove(&self, key: &str) {
        if let Err(e) = self.quotes.remove(key) {
            debug!("DiskStore remove error: {e}");
        }
    }

    async fn clear(&self) {
        let keys: Vec<_> = self
            .quotes
            .iter()
            .filter_map(|kv| kv.ok().map(|(k, _)| k))
            .collect();
        for key in keys {
            if let Err(e) = self.quotes.remove(key) {
                debug!("DiskStore clear error: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_disk_cache_get_put() {
        let dir = tempdir().unwrap();
        let cache = DiskStore::open(dir.path()).unwrap();

        // Initially, cache is empty
        assert!(cache.get("key1").await.is_none());

        // Put a value without TTL
        cache.put("key1", "95.10".to_string(), None).await;

        // Get the value
        assert_eq!(cache.get("key1").await.as_deref(), Some("95.10"));

        // Get a non-existent key
        assert!(cache.get("key2").await.is_none());
    }

    #[tokio::test]
    async fn test_disk_cache_ttl_expiration() {
        let dir = tempdir().unwrap();
        let cache = DiskStore::open(dir.path()).unwrap();

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
    async fn test_disk_cache_persists_across_reopen() {
        let dir = tempdir().unwrap();
        {
            let cache = DiskStore::open(dir.path()).unwrap();
            cache.put("VTI", "95.10".to_string(), None).await;
        }

        // A fresh handle over the same path sees the stored value exactly.
        let cache = DiskStore::open(dir.path()).unwrap();
        assert_eq!(cache.get("VTI").await.as_deref(), Some("95.10"));
    }

    #[tokio::test]
    async fn test_disk_cache_remove() {
        let dir = tempdir().unwrap();
        let cache = DiskStore::open(dir.path()).unwrap();

        cache.put("key1", "1".to_string(), None).await;
        assert!(cache.get("key1").await.is_some());

        cache.remove("key1").await;
        assert!(cache.get("key1").await.is_none());
    }

    #[tokio::test]
    async fn test_disk_cache_clear() {
        let dir = tempdir().unwrap();
        let cache = DiskStore::open(dir.path()).unwrap();

        cache.put("key1", "1".to_string(), None).await;
        cache.put("key2", "2".to_string(), None).await;

        cache.clear().await;

        assert!(cache.get("key1").await.is_none());
        assert!(cache.get("key2").await.is_none());
    }
}
