//! Offline account administration
//!
//! Talks to the database directly; the server does not need to be running.

use crate::server::{load_config, open_database};
use anyhow::{Context, Result};
use quotagate_core::{AccountStore, AdminStore, NewAccount, SqliteAccountStore};
use tracing::info;

/// Create an admin operator
pub async fn create_admin(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() || password.is_empty() {
        anyhow::bail!("email and password must not be empty");
    }

    let config = load_config().context("Failed to load configuration")?;
    let db = open_database(&config).await?;

    let admin = AdminStore::new(db.pool().clone())
        .create(email.trim(), password)
        .await
        .context("Failed to create admin")?;

    info!(admin_id = admin.id, "Admin created");
    println!("Admin {} created (id {})", admin.email, admin.id);
    Ok(())
}

/// Create a caller account and print its API key
pub async fn create_user(name: &str, reg_no: &str, limit: Option<i64>) -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    let limit = limit.unwrap_or(config.quota.default_limit);
    if limit < 0 {
        anyhow::bail!("limit must not be negative");
    }

    let db = open_database(&config).await?;
    let account = SqliteAccountStore::new(db.pool().clone())
        .create(NewAccount::new(name, reg_no).with_limit(limit))
        .await
        .context("Failed to create user")?;

    info!(account_id = account.id, "Account created");
    println!(
        "User {} created (id {}, limit {}). API key: {}",
        account.registration_number, account.id, account.quota_limit, account.api_key
    );
    Ok(())
}
