mod noop_store;
mod redis_store;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use noop_store::NoopCacheStore;
use redis_store::RedisCacheStore;

/// How long a resolved guild leveling config stays cached.
pub const CONFIG_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Debug)]
enum CacheBackend {
    Disabled(NoopCacheStore),
    Redis(RedisCacheStore),
}

/// Optional read-through cache in front of PostgreSQL.
///
/// With the `Disabled` backend every lookup misses and every write is
/// dropped, so callers never need to branch on whether Redis is configured.
#[derive(Clone, Debug)]
pub struct CacheService {
    key_prefix: String,
    backend: CacheBackend,
}

impl CacheService {
    pub fn disabled(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Disabled(NoopCacheStore),
        }
    }

    pub fn redis(redis_url: &str, prefix: impl Into<String>) -> anyhow::Result<Self> {
        let store = RedisCacheStore::from_url(redis_url)?;
        Ok(Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Redis(store),
        })
    }

    pub fn is_redis_enabled(&self) -> bool {
        matches!(self.backend, CacheBackend::Redis(_))
    }

    /// Namespace a key under the configured prefix.
    pub fn key(&self, suffix: impl AsRef<str>) -> String {
        format!("{}:{}", self.key_prefix, suffix.as_ref())
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled(_) => Ok(()),
            CacheBackend::Redis(store) => store.ping().await,
        }
    }

    async fn get_raw(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        match &self.backend {
            CacheBackend::Disabled(store) => store.get(key).await,
            CacheBackend::Redis(store) => store.get(key).await,
        }
    }

    pub async fn get_json<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(bytes) = self.get_raw(key).await? else {
            return Ok(None);
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| anyhow::anyhow!("failed to decode cached value for `{key}`: {e}"))
    }

    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Duration) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let payload = serde_json::to_vec(value)
            .map_err(|e| anyhow::anyhow!("failed to encode cache value for `{key}`: {e}"))?;
        let ttl_seconds = ttl.as_secs().max(1);

        match &self.backend {
            CacheBackend::Disabled(store) => store.set(key, payload, ttl_seconds).await,
            CacheBackend::Redis(store) => store.set(key, payload, ttl_seconds).await,
        }
    }

    pub async fn del(&self, key: &str) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled(store) => store.del(key).await,
            CacheBackend::Redis(store) => store.del(key).await,
        }
    }

    /// Return the cached value, or run `loader` and cache what it returns.
    ///
    /// Cache failures are logged and bypassed; only loader errors propagate.
    pub async fn get_or_load_json<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        match self.get_json::<T>(key).await {
            Ok(Some(hit)) => {
                debug!(cache_key = key, "cache hit");
                return Ok(hit);
            }
            Ok(None) => {}
            Err(source) => warn!(?source, cache_key = key, "cache read failed; loading from database"),
        }

        let loaded = loader().await?;

        if let Err(source) = self.set_json(key, &loaded, ttl).await {
            warn!(?source, cache_key = key, "cache write failed; value served uncached");
        }

        Ok(loaded)
    }
}

pub fn leveling_config_key(cache: &CacheService, guild_id: u64) -> String {
    cache.key(format!("leveling:config:{guild_id}"))
}

pub async fn invalidate_leveling_config(cache: &CacheService, guild_id: u64) -> anyhow::Result<()> {
    cache.del(&leveling_config_key(cache, guild_id)).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{CacheService, leveling_config_key};

    #[test]
    fn keys_are_prefixed() {
        let cache = CacheService::disabled("saphy:test");
        assert_eq!(leveling_config_key(&cache, 9), "saphy:test:leveling:config:9");
        assert!(!cache.is_redis_enabled());
    }

    #[tokio::test]
    async fn disabled_cache_always_loads() {
        let cache = CacheService::disabled("saphy:test");
        cache
            .set_json("k", &5_u64, Duration::from_secs(10))
            .await
            .expect("noop set");

        let first: u64 = cache
            .get_or_load_json("k", Duration::from_secs(10), || async { Ok(1) })
            .await
            .expect("load");
        let second: u64 = cache
            .get_or_load_json("k", Duration::from_secs(10), || async { Ok(2) })
            .await
            .expect("load");

        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }
}
