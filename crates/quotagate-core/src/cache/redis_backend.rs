//! Redis cache backend
//!
//! One multiplexed connection is created lazily and shared by all requests.
//! It is dropped after a failed command and re-established on next use.

use super::CacheBackend;
use crate::error::{Error, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Redis-backed cache
pub struct RedisCache {
    client: redis::Client,
    conn: Mutex<Option<MultiplexedConnection>>,
}

impl RedisCache {
    /// Create a backend. No connection is made until first use.
    ///
    /// # Errors
    ///
    /// Returns error if the Redis URL is invalid
    pub fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| Error::Cache(e.to_string()))?;
        Ok(Self {
            client,
            conn: Mutex::new(None),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Cache(format!("Redis connection failed: {}", e)))?;
        info!("Redis cache connection established");
        *guard = Some(conn.clone());
        Ok(conn)
    }

    async fn reset(&self) {
        *self.conn.lock().await = None;
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let result = redis::cmd("GET")
            .arg(key)
            .query_async::<Option<String>>(&mut conn)
            .await;

        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                self.reset().await;
                Err(Error::Cache(format!("Redis GET failed: {}", e)))
            }
        }
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.connection().await?;
        let result = redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_secs.max(1))
            .arg(value)
            .query_async::<()>(&mut conn)
            .await;

        match result {
            Ok(()) => {
                debug!(ttl = ttl_secs, "Value stored in Redis");
                Ok(())
            }
            Err(e) => {
                self.reset().await;
                Err(Error::Cache(format!("Redis SETEX failed: {}", e)))
            }
        }
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| Error::Cache(format!("Redis PING failed: {}", e)))?;
        Ok(())
    }
}
