//! Prompt-keyed answer cache
//!
//! Keys are `prefix + base64url(prompt)` over the prompt exactly as received,
//! so they are deterministic, reversible and one-to-one. Values are JSON `{answer, cached_at}`. Every backend fault
//! degrades to a miss; the request path never fails because of the cache.

mod memory;
mod redis_backend;

pub use memory::MemoryCache;
pub use redis_backend::RedisCache;

use crate::error::Result;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default key prefix
pub const DEFAULT_PREFIX: &str = "quotagate:answer:";

/// Key-value backend with per-key expiry
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Backend name (for logging and health)
    fn name(&self) -> &str;

    /// Fetch a value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value that expires after `ttl_secs`
    async fn set_with_expiry(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// Liveness probe
    async fn ping(&self) -> Result<()>;
}

/// Cache behavior settings
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// When false every lookup misses and writes are skipped
    pub enabled: bool,
    /// Entry lifetime
    pub ttl_secs: u64,
    /// Key prefix
    pub prefix: String,
    /// Upper bound on a single backend operation
    pub op_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            prefix: DEFAULT_PREFIX.to_string(),
            op_timeout: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedAnswer {
    answer: String,
    cached_at: DateTime<Utc>,
}

/// Answer cache over a [`CacheBackend`]
#[derive(Clone)]
pub struct ResponseCache {
    backend: Arc<dyn CacheBackend>,
    settings: CacheSettings,
}

impl ResponseCache {
    /// Create a cache
    pub fn new(backend: Arc<dyn CacheBackend>, settings: CacheSettings) -> Self {
        Self { backend, settings }
    }

    /// Backend name
    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Whether lookups are enabled
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Cache key for a prompt
    #[must_use]
    pub fn key_for(&self, prompt: &str) -> String {
        format!(
            "{}{}",
            self.settings.prefix,
            URL_SAFE_NO_PAD.encode(prompt.as_bytes())
        )
    }

    /// Cached answer for `prompt`, or `None` on miss or any backend fault
    pub async fn get(&self, prompt: &str) -> Option<String> {
        if !self.settings.enabled {
            return None;
        }
        let key = self.key_for(prompt);

        let raw = match tokio::time::timeout(self.settings.op_timeout, self.backend.get(&key)).await
        {
            Ok(Ok(Some(raw))) => raw,
            Ok(Ok(None)) => {
                debug!(backend = self.backend.name(), "Cache miss");
                return None;
            }
            Ok(Err(e)) => {
                warn!(backend = self.backend.name(), error = %e, "Cache read failed, treating as miss");
                return None;
            }
            Err(_) => {
                warn!(backend = self.backend.name(), "Cache read timed out, treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<CachedAnswer>(&raw) {
            Ok(entry) => {
                debug!(backend = self.backend.name(), cached_at = %entry.cached_at, "Cache hit");
                Some(entry.answer)
            }
            Err(e) => {
                warn!(error = %e, "Malformed cache entry, treating as miss");
                None
            }
        }
    }

    /// Store `answer` for `prompt`. Failures are logged and dropped.
    pub async fn set(&self, prompt: &str, answer: &str) {
        if !self.settings.enabled {
            return;
        }
        let key = self.key_for(prompt);
        let entry = CachedAnswer {
            answer: answer.to_string(),
            cached_at: Utc::now(),
        };
        let value = match serde_json::to_string(&entry) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to serialize cache entry");
                return;
            }
        };

        let write = self
            .backend
            .set_with_expiry(&key, &value, self.settings.ttl_secs);
        match tokio::time::timeout(self.settings.op_timeout, write).await {
            Ok(Ok(())) => debug!(ttl = self.settings.ttl_secs, "Answer cached"),
            Ok(Err(e)) => warn!(backend = self.backend.name(), error = %e, "Cache write failed"),
            Err(_) => warn!(backend = self.backend.name(), "Cache write timed out"),
        }
    }

    /// Probe the backend
    pub async fn health(&self) -> Result<()> {
        match tokio::time::timeout(self.settings.op_timeout, self.backend.ping()).await {
            Ok(result) => result,
            Err(_) => Err(crate::error::Error::Cache("ping timed out".to_string())),
        }
    }
}
