//! Redis cache for computed results and rate limiting.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use redis::{aio::ConnectionManager, AsyncCommands, RedisError};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use common::{AppError, AppResult, CacheConfig};

/// Cache key prefix for survey summaries
const CACHE_PREFIX_SURVEY_SUMMARY: &str = "summary:survey:";

/// Cache key prefix for class gap analyses
const CACHE_PREFIX_GAP_ANALYSIS: &str = "gap:class:";

/// Cache key prefix for class feedback summaries
const CACHE_PREFIX_FEEDBACK: &str = "feedback:class:";

/// Cache key prefix for rate limiting
const CACHE_PREFIX_RATE_LIMIT: &str = "rate_limit:";

pub fn survey_summary_key(survey_id: Uuid) -> String {
    format!("{}{}", CACHE_PREFIX_SURVEY_SUMMARY, survey_id)
}

pub fn gap_analysis_key(class_id: Uuid) -> String {
    format!("{}{}", CACHE_PREFIX_GAP_ANALYSIS, class_id)
}

pub fn feedback_summary_key(class_id: Uuid) -> String {
    format!("{}{}", CACHE_PREFIX_FEEDBACK, class_id)
}

/// Raw key-value operations behind [`Cache`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()>;

    async fn delete(&self, keys: Vec<String>) -> AppResult<()>;

    /// Increment a counter whose window starts on its first hit.
    async fn incr_window(&self, key: &str, window_seconds: u64) -> AppResult<u64>;
}

/// Redis-backed store.
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        debug!("Connecting to Redis at {}", url);
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key).await.map_err(|e| {
            warn!("Redis get error for key {}: {}", key, e);
            AppError::from(e)
        })
    }

    async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(|e| {
                warn!("Redis set error for key {}: {}", key, e);
                AppError::from(e)
            })
    }

    async fn delete(&self, keys: Vec<String>) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&keys).await.map_err(|e| {
            warn!("Redis delete error for keys {:?}: {}", keys, e);
            AppError::from(e)
        })
    }

    async fn incr_window(&self, key: &str, window_seconds: u64) -> AppResult<u64> {
        let mut conn = self.conn.clone();
        let count: u64 = conn.incr(key, 1).await?;

        // Start the window on the first request
        if count == 1 {
            conn.expire::<_, ()>(key, window_seconds as i64).await?;
        }
        Ok(count)
    }
}

/// Typed cache over a [`CacheStore`].
pub struct Cache {
    store: Arc<dyn CacheStore>,
    results_ttl: u64,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>, results_ttl: u64) -> Self {
        Self { store, results_ttl }
    }

    /// Connect to Redis.
    pub async fn connect(config: &CacheConfig) -> Result<Self, RedisError> {
        let store = RedisStore::connect(&config.url).await?;
        Ok(Self::new(Arc::new(store), config.results_ttl_seconds))
    }

    // =========================================================================
    // Generic Cache Operations
    // =========================================================================

    /// Get a value from cache.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.store.get(key).await? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!("Failed to deserialize cached value for key {}: {}", key, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Set a value in cache with custom TTL.
    pub async fn set_with_ttl<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> AppResult<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::internal(format!("Serialization error: {}", e)))?;
        self.store.set_ex(key, json, ttl_seconds).await
    }

    /// Delete one or more keys.
    pub async fn delete(&self, keys: Vec<String>) -> AppResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        self.store.delete(keys).await
    }

    // =========================================================================
    // Computed Results
    // =========================================================================

    /// Cached result for `key`, or compute and store it.
    ///
    /// Cache failures are logged and fall through to `compute`.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, compute: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = AppResult<T>>,
    {
        match self.get::<T>(key).await {
            Ok(Some(value)) => {
                debug!("Cache hit for {}", key);
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) => warn!("Cache unavailable for {}: {}", key, e),
        }

        let value = compute().await?;
        if let Err(e) = self.set_with_ttl(key, &value, self.results_ttl).await {
            warn!("Failed to cache {}: {}", key, e);
        }
        Ok(value)
    }

    /// Drop the class gap analysis and the summaries of `survey_ids`.
    pub async fn invalidate_results(&self, class_id: Uuid, survey_ids: &[Uuid]) {
        let mut keys = vec![gap_analysis_key(class_id)];
        keys.extend(survey_ids.iter().copied().map(survey_summary_key));

        if let Err(e) = self.delete(keys).await {
            warn!("Failed to invalidate results for class {}: {}", class_id, e);
        }
    }

    /// Drop the feedback summary of a class.
    pub async fn invalidate_feedback(&self, class_id: Uuid) {
        if let Err(e) = self.delete(vec![feedback_summary_key(class_id)]).await {
            warn!("Failed to invalidate feedback for class {}: {}", class_id, e);
        }
    }

    // =========================================================================
    // Rate Limiting
    // =========================================================================

    /// Check rate limit and increment counter.
    /// Returns (current_count, allowed).
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let count = self.store.incr_window(&key, window_seconds).await?;
        Ok((count, count <= max_requests))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn test_result_keys_are_scoped() {
        let id = Uuid::new_v4();
        assert_eq!(survey_summary_key(id), format!("summary:survey:{}", id));
        assert_eq!(gap_analysis_key(id), format!("gap:class:{}", id));
        assert_ne!(gap_analysis_key(id), feedback_summary_key(id));
    }

    #[tokio::test]
    async fn test_invalidate_results_drops_gap_and_every_summary() {
        let class_id = Uuid::new_v4();
        let surveys = [Uuid::new_v4(), Uuid::new_v4()];

        let mut store = MockCacheStore::new();
        store
            .expect_delete()
            .with(eq(vec![
                gap_analysis_key(class_id),
                survey_summary_key(surveys[0]),
                survey_summary_key(surveys[1]),
            ]))
            .times(1)
            .returning(|_| Ok(()));

        Cache::new(Arc::new(store), 60)
            .invalidate_results(class_id, &surveys)
            .await;
    }

    #[tokio::test]
    async fn test_get_or_compute_stores_with_results_ttl() {
        let mut store = MockCacheStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set_ex()
            .with(eq("gap:class:x"), eq("42".to_string()), eq(90u64))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let value = Cache::new(Arc::new(store), 90)
            .get_or_compute("gap:class:x", || async { Ok(42u32) })
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_cache_outage_falls_through_to_compute() {
        let mut store = MockCacheStore::new();
        store
            .expect_get()
            .returning(|_| Err(AppError::internal("redis down")));
        store
            .expect_set_ex()
            .returning(|_, _, _| Err(AppError::internal("redis down")));

        let value = Cache::new(Arc::new(store), 60)
            .get_or_compute("summary:survey:x", || async { Ok("fresh".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "fresh");
    }

    #[tokio::test]
    async fn test_rate_limit_counts_against_max() {
        let mut store = MockCacheStore::new();
        store
            .expect_incr_window()
            .with(eq("rate_limit:api:10.0.0.1"), eq(60u64))
            .returning(|_, _| Ok(3));

        let cache = Cache::new(Arc::new(store), 60);
        assert_eq!(cache.check_rate_limit("api:10.0.0.1", 3, 60).await.unwrap(), (3, true));
        assert_eq!(cache.check_rate_limit("api:10.0.0.1", 2, 60).await.unwrap(), (3, false));
    }
}
