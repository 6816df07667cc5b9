//! Store initialization functions
//!
//! Builds the database, cache backend and dispatch pipeline once at startup;
//! everything is shared with the handlers through `Arc`s.

use super::config::{AppConfig, CacheBackendKind};
use super::providers::build_dispatcher;
use crate::middleware::auth::AdminGuard;
use anyhow::{Context, Result};
use quotagate_core::{
    AccountStore, AdminStore, CacheBackend, CooldownGuard, Database, DispatchPipeline, LogStore,
    MemoryCache, RedisCache, ResponseCache, SqliteAccountStore, SqliteLogStore,
};
use quotagate_llm::Dispatcher;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Everything the HTTP layer needs
#[derive(Clone)]
pub struct Services {
    pub database: Database,
    pub pipeline: Arc<DispatchPipeline>,
    pub accounts: Arc<dyn AccountStore>,
    pub logs: Arc<dyn LogStore>,
    pub admin: Arc<AdminGuard>,
    pub default_quota: i64,
}

impl Services {
    /// Assemble services from already-built parts
    pub fn assemble(
        database: Database,
        cache: ResponseCache,
        cooldown: CooldownGuard,
        dispatcher: Arc<dyn Dispatcher>,
        panel_key: String,
        default_quota: i64,
    ) -> Self {
        let accounts: Arc<dyn AccountStore> =
            Arc::new(SqliteAccountStore::new(database.pool().clone()));
        let logs: Arc<dyn LogStore> = Arc::new(SqliteLogStore::new(database.pool().clone()));
        let admin_store = AdminStore::new(database.pool().clone());

        let pipeline = Arc::new(DispatchPipeline::new(
            Arc::clone(&accounts),
            Arc::clone(&logs),
            cache,
            cooldown,
            dispatcher,
        ));

        Self {
            database,
            pipeline,
            accounts,
            logs,
            admin: Arc::new(AdminGuard::new(admin_store, panel_key)),
            default_quota,
        }
    }
}

/// Open the configured SQLite database
pub async fn open_database(config: &AppConfig) -> Result<Database> {
    Database::connect(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to initialize SQLite database")
}

/// Build the cache backend, falling back to memory when Redis is unusable
async fn init_cache_backend(config: &AppConfig) -> Arc<dyn CacheBackend> {
    if config.cache.backend == CacheBackendKind::Memory {
        info!("In-memory answer cache initialized");
        return Arc::new(MemoryCache::new());
    }

    match RedisCache::new(&config.redis.url) {
        Ok(redis) => match redis.ping().await {
            Ok(()) => {
                info!("Redis answer cache initialized");
                Arc::new(redis)
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable, using in-memory answer cache");
                Arc::new(MemoryCache::new())
            }
        },
        Err(e) => {
            warn!(error = %e, "Invalid Redis URL, using in-memory answer cache");
            Arc::new(MemoryCache::new())
        }
    }
}

/// Initialize all services from configuration
pub async fn init_services(config: &AppConfig) -> Result<Services> {
    let database = open_database(config).await?;

    let backend = init_cache_backend(config).await;
    let cache = ResponseCache::new(backend, config.cache.settings());
    if !cache.is_enabled() {
        info!("Answer cache DISABLED");
    }

    let cooldown = CooldownGuard::new(Duration::from_millis(config.cooldown.window_ms));
    info!(window_ms = config.cooldown.window_ms, "Cooldown guard initialized");

    let dispatcher = build_dispatcher(&config.gemini)?;
    info!(
        provider = dispatcher.name(),
        model = dispatcher.model(),
        fallbacks = config.gemini.fallback_models.len(),
        "Dispatcher initialized"
    );

    Ok(Services::assemble(
        database,
        cache,
        cooldown,
        dispatcher,
        config.server.admin.panel_key.clone(),
        config.quota.default_limit,
    ))
}
