//! Generation idempotency cache.
//!
//! A CV generation is an expensive LLM round-trip; repeating an identical
//! request within the hour returns the cached result instead. The key covers
//! everything that influences output: user, analysis, template, and options.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::AppError;
use crate::widgets::bridge::BridgeOptions;

/// Cached generations expire after one hour.
pub const CACHE_TTL_SECS: u64 = 3600;

/// Storage backend for cached generation responses.
#[async_trait]
pub trait GenerationCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), AppError>;
}

/// Stable hash of the bridge options, so changing any option misses the cache.
pub fn options_hash(opts: &BridgeOptions) -> u64 {
    let mut hasher = DefaultHasher::new();
    opts.min_score.hash(&mut hasher);
    opts.max_experiences.hash(&mut hasher);
    opts.max_bullets_per_experience.hash(&mut hasher);
    hasher.finish()
}

pub fn cache_key(user_id: Uuid, analysis_id: Uuid, template: &str, opts: &BridgeOptions) -> String {
    format!(
        "cvgen:{user_id}:{analysis_id}:{template}:{:x}",
        options_hash(opts)
    )
}

/// Redis-backed cache used in production.
pub struct RedisGenerationCache {
    client: redis::Client,
}

impl RedisGenerationCache {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GenerationCache for RedisGenerationCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }
}

/// In-memory cache for tests.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (Instant, String)>>,
}

#[async_trait]
impl GenerationCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(key)
            .filter(|(expires, _)| *expires > Instant::now())
            .map(|(_, v)| v.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), AppError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            (
                Instant::now() + Duration::from_secs(ttl_secs),
                value.to_string(),
            ),
        );
        Ok(())
    }
}
