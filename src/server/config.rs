//! Server configuration types

use quotagate_core::CacheSettings;
use serde::Deserialize;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub cooldown: CooldownConfig,
    #[serde(default)]
    pub gemini: GeminiAppConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub admin: AdminConfig,
    /// Prebuilt dashboard bundle to serve at `/`
    #[serde(default)]
    pub web_ui_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin: AdminConfig::default(),
            web_ui_dir: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

/// Admin API configuration
#[derive(Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Expected value of the `apis-key` header
    #[serde(default)]
    pub panel_key: String,
}

// SECURITY: never print the panel key
impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("panel_key", &quotagate_llm::util::mask_api_key(&self.panel_key))
            .finish()
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite:data/quotagate.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

/// Cache backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    Redis,
    Memory,
}

/// Answer cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub backend: CacheBackendKind,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_prefix")]
    pub prefix: String,
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackendKind::default(),
            ttl_secs: default_ttl_secs(),
            prefix: default_cache_prefix(),
            op_timeout_ms: default_op_timeout_ms(),
        }
    }
}

impl CacheConfig {
    pub fn settings(&self) -> CacheSettings {
        CacheSettings {
            enabled: self.enabled,
            ttl_secs: self.ttl_secs,
            prefix: self.prefix.clone(),
            op_timeout: Duration::from_millis(self.op_timeout_ms),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_cache_prefix() -> String {
    quotagate_core::cache::DEFAULT_PREFIX.to_string()
}

fn default_op_timeout_ms() -> u64 {
    500
}

/// Cooldown configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CooldownConfig {
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
        }
    }
}

fn default_window_ms() -> u64 {
    quotagate_core::cooldown::DEFAULT_WINDOW_MS
}

/// Gemini dispatcher configuration (the API key comes from the environment)
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiAppConfig {
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default)]
    pub fallback_models: Vec<String>,
    #[serde(default = "default_gemini_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_instruction_template")]
    pub instruction_template: String,
}

impl Default for GeminiAppConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            fallback_models: Vec::new(),
            timeout_secs: default_gemini_timeout(),
            instruction_template: default_instruction_template(),
        }
    }
}

fn default_gemini_base_url() -> String {
    quotagate_llm::gemini::DEFAULT_BASE_URL.to_string()
}

fn default_gemini_model() -> String {
    quotagate_llm::DEFAULT_MODEL.to_string()
}

fn default_gemini_timeout() -> u64 {
    30
}

fn default_instruction_template() -> String {
    quotagate_llm::DEFAULT_INSTRUCTION_TEMPLATE.to_string()
}

/// Quota configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
    /// Limit given to accounts created without an explicit one
    #[serde(default = "default_quota_limit")]
    pub default_limit: i64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            default_limit: default_quota_limit(),
        }
    }
}

fn default_quota_limit() -> i64 {
    quotagate_core::account::DEFAULT_QUOTA_LIMIT
}
