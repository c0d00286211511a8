use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::ActionOutcome;
use crate::error::MatchError;
use crate::models::{Match, MatchAction, MatchStatus, Profile};
use crate::services::storage::{ProfileFilter, Storage};

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Multi-tier cache manager
///
/// L1 is an in-process moka cache; L2 is Redis, shared across instances,
/// and optional.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a cache manager backed by Redis
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Some(Arc::new(tokio::sync::Mutex::new(redis))),
            l1_cache: build_l1(l1_size, ttl_secs),
            ttl_secs,
        })
    }

    /// Create an L1-only cache manager
    pub fn in_memory(l1_size: u64, ttl_secs: u64) -> Self {
        Self {
            redis: None,
            l1_cache: build_l1(l1_size, ttl_secs),
            ttl_secs,
        }
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let value: Option<String> = redis::cmd("GET")
                .arg(key)
                .query_async(&mut *conn)
                .await?;
            drop(conn);

            if let Some(json) = value {
                tracing::trace!("L2 cache hit: {}", key);
                self.l1_cache
                    .insert(key.to_string(), json.as_bytes().to_vec())
                    .await;
                return Ok(serde_json::from_str(&json)?);
            }
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in every tier
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;
        self.l1_cache
            .insert(key.to_string(), json.as_bytes().to_vec())
            .await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let _: () = redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Delete a value from every tier
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let _: () = redis::cmd("DEL")
                .arg(key)
                .query_async(&mut *conn)
                .await?;
        }
        Ok(())
    }
}

fn build_l1(l1_size: u64, ttl_secs: u64) -> moka::future::Cache<String, Vec<u8>> {
    moka::future::CacheBuilder::new(l1_size)
        .time_to_live(Duration::from_secs(ttl_secs))
        .build()
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a user's profile
    pub fn profile(user_id: &str) -> String {
        format!("profile:{}", user_id)
    }
}

/// Storage decorator that caches profile lookups
///
/// Match rows always go straight to the inner store: their state changes on
/// every like/pass and must stay linearizable.
pub struct CachedStorage<S> {
    inner: S,
    cache: Arc<CacheManager>,
}

impl<S: Storage> CachedStorage<S> {
    pub fn new(inner: S, cache: Arc<CacheManager>) -> Self {
        Self { inner, cache }
    }

    async fn invalidate(&self, user_id: &str) {
        if let Err(e) = self.cache.delete(&CacheKey::profile(user_id)).await {
            tracing::warn!("Failed to invalidate profile cache: {}", e);
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Storage for CachedStorage<S> {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, MatchError> {
        let key = CacheKey::profile(user_id);
        match self.cache.get::<Profile>(&key).await {
            Ok(profile) => return Ok(Some(profile)),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Profile cache read failed for {}: {}", user_id, e),
        }

        let profile = self.inner.get_profile(user_id).await?;
        if let Some(p) = &profile {
            if let Err(e) = self.cache.set(&key, p).await {
                tracing::warn!("Profile cache write failed for {}: {}", user_id, e);
            }
        }
        Ok(profile)
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, MatchError> {
        let stored = self.inner.upsert_profile(profile).await?;
        self.invalidate(&profile.user_id).await;
        Ok(stored)
    }

    async fn set_active(&self, user_id: &str, active: bool) -> Result<Option<Profile>, MatchError> {
        let stored = self.inner.set_active(user_id, active).await?;
        self.invalidate(user_id).await;
        Ok(stored)
    }

    async fn query_profiles(&self, filter: &ProfileFilter) -> Result<Vec<Profile>, MatchError> {
        self.inner.query_profiles(filter).await
    }

    async fn get_match(&self, id: Uuid) -> Result<Option<Match>, MatchError> {
        self.inner.get_match(id).await
    }

    async fn find_match_between(&self, a: &str, b: &str) -> Result<Option<Match>, MatchError> {
        self.inner.find_match_between(a, b).await
    }

    async fn matched_user_ids(&self, user_id: &str) -> Result<HashSet<String>, MatchError> {
        self.inner.matched_user_ids(user_id).await
    }

    async fn insert_match(&self, record: &Match) -> Result<(), MatchError> {
        self.inner.insert_match(record).await
    }

    async fn apply_action(
        &self,
        id: Uuid,
        action: MatchAction,
        user_id: &str,
    ) -> Result<ActionOutcome, MatchError> {
        self.inner.apply_action(id, action, user_id).await
    }

    async fn list_matches(
        &self,
        user_id: &str,
        statuses: &[MatchStatus],
    ) -> Result<Vec<Match>, MatchError> {
        self.inner.list_matches(user_id, statuses).await
    }

    async fn health_check(&self) -> Result<bool, MatchError> {
        self.inner.health_check().await
    }
}
