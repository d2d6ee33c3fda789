//! Session cache stores.
//!
//! Sessions are stored as `login_user:{token}` keys holding the admin id,
//! with a TTL. [`InMemoryCache`] serves single-process deployments and tests;
//! `RedisCache` (feature `redis`) shares sessions between processes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use adminkit_core::settings::AdminSettings;
use adminkit_core::{AdminError, AdminResult};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// A key-value store with expiring entries.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// The value of `key`, if present and not expired.
    async fn get(&self, key: &str) -> AdminResult<Option<String>>;

    /// Stores `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AdminResult<()>;

    /// Removes `key`. Missing keys are not an error.
    async fn delete(&self, key: &str) -> AdminResult<()>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// An in-process cache with lazy expiry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl InMemoryCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        self.store
            .read()
            .await
            .values()
            .filter(|entry| !entry.is_expired())
            .count()
    }

    /// Returns `true` if no live entry remains.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> AdminResult<Option<String>> {
        let store = self.store.read().await;
        Ok(store
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AdminResult<()> {
        let mut store = self.store.write().await;
        store.retain(|_, entry| !entry.is_expired());
        store.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> AdminResult<()> {
        self.store.write().await.remove(key);
        Ok(())
    }
}

#[cfg(feature = "redis")]
pub use redis_store::RedisCache;

#[cfg(feature = "redis")]
mod redis_store {
    use std::fmt;
    use std::time::Duration;

    use adminkit_core::{AdminError, AdminResult};
    use async_trait::async_trait;
    use redis::aio::ConnectionManager;
    use redis::AsyncCommands;

    use super::CacheStore;

    fn cache_error(e: redis::RedisError) -> AdminError {
        AdminError::Cache(format!("{e}"))
    }

    /// Sessions in Redis, written with `SET EX`.
    #[derive(Clone)]
    pub struct RedisCache {
        connection: ConnectionManager,
    }

    impl fmt::Debug for RedisCache {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("RedisCache").finish_non_exhaustive()
        }
    }

    impl RedisCache {
        /// Connects to `url`, e.g. `redis://localhost:6379/0`.
        pub async fn connect(url: &str) -> AdminResult<Self> {
            let client = redis::Client::open(url).map_err(cache_error)?;
            let connection = ConnectionManager::new(client).await.map_err(cache_error)?;
            tracing::info!("Connected session store to Redis");
            Ok(Self { connection })
        }
    }

    #[async_trait]
    impl CacheStore for RedisCache {
        async fn get(&self, key: &str) -> AdminResult<Option<String>> {
            let mut connection = self.connection.clone();
            connection.get(key).await.map_err(cache_error)
        }

        async fn set(&self, key: &str, value: &str, ttl: Duration) -> AdminResult<()> {
            let mut connection = self.connection.clone();
            connection
                .set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
                .await
                .map_err(cache_error)
        }

        async fn delete(&self, key: &str) -> AdminResult<()> {
            let mut connection = self.connection.clone();
            connection.del::<_, ()>(key).await.map_err(cache_error)
        }
    }
}

/// The session store named by the settings: Redis when `redis_url` is set,
/// otherwise an in-memory cache.
///
/// Fails with `MissingDependency` when `redis_url` is set but the `redis`
/// feature is off.
pub async fn cache_from_settings(settings: &AdminSettings) -> AdminResult<Arc<dyn CacheStore>> {
    match &settings.redis_url {
        #[cfg(feature = "redis")]
        Some(url) => Ok(Arc::new(RedisCache::connect(url).await?)),
        #[cfg(not(feature = "redis"))]
        Some(_) => Err(AdminError::missing_dependency(
            "RedisCache",
            "redis",
            "adminkit-auth",
        )),
        None => Ok(Arc::new(InMemoryCache::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = InMemoryCache::new();
        cache
            .set("login_user:abc", "1", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("login_user:abc").await.unwrap().as_deref(), Some("1"));
        cache.delete("login_user:abc").await.unwrap();
        assert!(cache.get("login_user:abc").await.unwrap().is_none());
        cache.delete("login_user:abc").await.unwrap();
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = InMemoryCache::new();
        cache.set("k", "v", Duration::from_millis(50)).await.unwrap();
        assert_eq!(cache.len().await, 1);
        std::thread::sleep(Duration::from_millis(60));
        assert!(cache.get("k").await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_sessions_coexist() {
        let cache = InMemoryCache::new();
        cache.set("login_user:a", "7", Duration::from_secs(60)).await.unwrap();
        cache.set("login_user:b", "7", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.len().await, 2);
    }

    #[cfg(not(feature = "redis"))]
    #[tokio::test]
    async fn test_redis_without_feature() {
        let settings = AdminSettings {
            redis_url: Some("redis://localhost".into()),
            ..AdminSettings::default()
        };
        let err = cache_from_settings(&settings).await.err().unwrap();
        assert!(matches!(err, AdminError::MissingDependency { ref feature, .. } if feature == "redis"));
        assert!(err.to_string().contains("redis"));
    }

    #[tokio::test]
    async fn test_default_is_in_memory() {
        let store = cache_from_settings(&AdminSettings::default()).await.unwrap();
        store.set("k", "v", Duration::from_secs(1)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
