use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::PageCacheBackend;
use crate::error::Result;
use crate::metrics::HOME_CACHE_EVENTS;

const KEY_PREFIX: &str = "index_page";

/// Cache-aside wrapper for the rendered home page.
///
/// A cached page is served verbatim until it expires or is invalidated, even
/// if posts were written in between. Backend failures fall through to a
/// fresh render.
#[derive(Clone)]
pub struct HomePageCache {
    backend: Arc<dyn PageCacheBackend>,
    ttl: Duration,
}

impl HomePageCache {
    pub fn new(backend: Arc<dyn PageCacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    fn key(page: i64) -> String {
        format!("{}:{}", KEY_PREFIX, page)
    }

    pub async fn get_or_render<F, Fut>(&self, page: i64, render: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let key = Self::key(page);

        match self.backend.get(&key).await {
            Ok(Some(body)) => {
                debug!(page, "home cache HIT");
                HOME_CACHE_EVENTS.with_label_values(&["hit"]).inc();
                return Ok(body);
            }
            Ok(None) => {
                debug!(page, "home cache MISS");
                HOME_CACHE_EVENTS.with_label_values(&["miss"]).inc();
            }
            Err(e) => {
                warn!(page, error = %e, "home cache read failed, rendering fresh");
                HOME_CACHE_EVENTS.with_label_values(&["error"]).inc();
            }
        }

        let body = render().await?;

        if let Err(e) = self.backend.set(&key, &body, self.ttl).await {
            warn!(page, error = %e, "home cache write failed");
            HOME_CACHE_EVENTS.with_label_values(&["error"]).inc();
        }

        Ok(body)
    }

    /// Drop every cached page.
    pub async fn invalidate(&self) -> Result<u64> {
        let removed = self.backend.clear_prefix(KEY_PREFIX).await?;
        HOME_CACHE_EVENTS.with_label_values(&["invalidate"]).inc();
        debug!(removed, "home cache invalidated");
        Ok(removed)
    }

    pub async fn ping(&self) -> Result<()> {
        self.backend.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryPageCache;
    use crate::error::AppError;
    use async_trait::async_trait;

    fn cache(ttl: Duration) -> HomePageCache {
        HomePageCache::new(Arc::new(MemoryPageCache::new()), ttl)
    }

    #[tokio::test]
    async fn serves_stale_page_within_window() {
        let cache = cache(Duration::from_secs(20));

        let first = cache
            .get_or_render(1, || async { Ok("v1".to_string()) })
            .await
            .unwrap();
        let second = cache
            .get_or_render(1, || async { Ok("v2".to_string()) })
            .await
            .unwrap();

        assert_eq!(first, "v1");
        assert_eq!(second, "v1");
    }

    #[tokio::test]
    async fn pages_are_cached_separately() {
        let cache = cache(Duration::from_secs(20));
        cache
            .get_or_render(1, || async { Ok("page one".to_string()) })
            .await
            .unwrap();
        let two = cache
            .get_or_render(2, || async { Ok("page two".to_string()) })
            .await
            .unwrap();
        assert_eq!(two, "page two");
    }

    #[tokio::test]
    async fn invalidate_forces_fresh_render() {
        let cache = cache(Duration::from_secs(20));
        cache
            .get_or_render(1, || async { Ok("v1".to_string()) })
            .await
            .unwrap();
        cache.invalidate().await.unwrap();

        let body = cache
            .get_or_render(1, || async { Ok("v2".to_string()) })
            .await
            .unwrap();
        assert_eq!(body, "v2");
    }

    #[tokio::test]
    async fn expiry_forces_fresh_render() {
        let cache = cache(Duration::from_millis(30));
        cache
            .get_or_render(1, || async { Ok("v1".to_string()) })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        let body = cache
            .get_or_render(1, || async { Ok("v2".to_string()) })
            .await
            .unwrap();
        assert_eq!(body, "v2");
    }

    struct BrokenBackend;

    #[async_trait]
    impl PageCacheBackend for BrokenBackend {
        async fn get(&self, _: &str) -> Result<Option<String>> {
            Err(AppError::Cache("connection refused".to_string()))
        }

        async fn set(&self, _: &str, _: &str, _: Duration) -> Result<()> {
            Err(AppError::Cache("connection refused".to_string()))
        }

        async fn clear_prefix(&self, _: &str) -> Result<u64> {
            Err(AppError::Cache("connection refused".to_string()))
        }

        async fn ping(&self) -> Result<()> {
            Err(AppError::Cache("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn backend_failure_degrades_to_render() {
        let cache = HomePageCache::new(Arc::new(BrokenBackend), Duration::from_secs(20));
        let body = cache
            .get_or_render(1, || async { Ok("fresh".to_string()) })
            .await
            .unwrap();
        assert_eq!(body, "fresh");
    }
}
