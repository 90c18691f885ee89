use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::PageCacheBackend;
use crate::error::Result;

/// Entry cap for the in-process cache.
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// In-process page cache. Expired entries are dropped on read and swept on
/// every write; past `max_entries` the entry closest to expiry is evicted.
pub struct MemoryPageCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
    max_entries: usize,
}

impl Default for MemoryPageCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }
}

impl MemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl PageCacheBackend for MemoryPageCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, expires_at)) if *expires_at > now => return Ok(Some(value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|(_, expires_at)| *expires_at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires_at)| *expires_at > now);

        while entries.len() >= self.max_entries && !entries.contains_key(key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, (_, expires_at))| *expires_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    entries.remove(&k);
                }
                None => break,
            }
        }

        entries.insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(())
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entries_expire() {
        let cache = MemoryPageCache::new();
        cache
            .set("index_page:1", "cached", Duration::from_millis(30))
            .await
            .unwrap();
        assert_eq!(cache.get("index_page:1").await.unwrap().as_deref(), Some("cached"));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get("index_page:1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_prefix_leaves_other_keys() {
        let cache = MemoryPageCache::new();
        let ttl = Duration::from_secs(20);
        cache.set("index_page:1", "a", ttl).await.unwrap();
        cache.set("index_page:2", "b", ttl).await.unwrap();
        cache.set("other:1", "c", ttl).await.unwrap();

        assert_eq!(cache.clear_prefix("index_page").await.unwrap(), 2);
        assert_eq!(cache.get("other:1").await.unwrap().as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn writes_sweep_expired_keys() {
        let cache = MemoryPageCache::new();
        for page in 1..=500 {
            cache
                .set(&format!("index_page:{}", page), "stale", Duration::from_millis(1))
                .await
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        cache
            .set("index_page:1", "fresh", Duration::from_secs(20))
            .await
            .unwrap();

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("index_page:1").await.unwrap().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn capacity_evicts_soonest_expiry() {
        let cache = MemoryPageCache::with_capacity(2);
        cache.set("index_page:1", "a", Duration::from_secs(5)).await.unwrap();
        cache.set("index_page:2", "b", Duration::from_secs(20)).await.unwrap();
        cache.set("index_page:3", "c", Duration::from_secs(20)).await.unwrap();

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("index_page:1").await.unwrap(), None);
        assert_eq!(cache.get("index_page:3").await.unwrap().as_deref(), Some("c"));

        cache.set("index_page:3", "c2", Duration::from_secs(20)).await.unwrap();
        assert_eq!(cache.get("index_page:2").await.unwrap().as_deref(), Some("b"));
    }
}
