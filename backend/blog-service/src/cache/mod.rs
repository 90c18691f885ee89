/// Page cache backends and the home page cache built on them
pub mod home_cache;
pub mod memory;
pub mod redis_cache;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

pub use home_cache::HomePageCache;
pub use memory::MemoryPageCache;
pub use redis_cache::RedisPageCache;

/// String store with per-entry expiry. Last writer wins.
#[async_trait]
pub trait PageCacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove every key starting with `prefix`; returns how many were removed.
    async fn clear_prefix(&self, prefix: &str) -> Result<u64>;

    async fn ping(&self) -> Result<()>;
}
