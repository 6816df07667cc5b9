//! Production configuration validation
//!
//! Security checks for production deployments.

use super::config::AppConfig;
use anyhow::Result;
use tracing::warn;

/// Validate configuration for production security
pub fn validate_production_config(config: &AppConfig) -> Result<()> {
    if config.server.admin.panel_key.is_empty() {
        warn!(
            "Admin panel key is not set; all admin API requests will be rejected. \
             Set QUOTAGATE_SERVER__ADMIN__PANEL_KEY."
        );
    }

    let is_production = std::env::var("QUOTAGATE_ENV")
        .map(|v| v.to_lowercase() == "production")
        .unwrap_or(false);

    if !is_production {
        return Ok(());
    }

    if config.server.host == "0.0.0.0" {
        warn!(
            "SECURITY WARNING: Server is binding to all interfaces (0.0.0.0) in production. \
             Consider binding to 127.0.0.1 and using a reverse proxy for TLS."
        );
    }

    if config.server.admin.panel_key.len() < 16 && !config.server.admin.panel_key.is_empty() {
        warn!("SECURITY WARNING: Admin panel key is shorter than 16 characters.");
    }

    if config.redis.url.starts_with("redis://") && !config.redis.url.contains('@') {
        warn!(
            "SECURITY WARNING: Redis connection appears to have no authentication in production. \
             Consider enabling Redis AUTH."
        );
    }

    Ok(())
}
