//! SQLite connection pool and schema
//!
//! All stores share one pool; each query borrows a connection for its own
//! duration only.

use crate::error::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Shared SQLite database
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to a `sqlite:` URL, creating the file and its directory if missing
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        if let Some(parent) = file_path(url).and_then(|p| p.parent().map(Path::to_path_buf)) {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(&parent).map_err(|e| {
                    Error::Internal(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::Internal(format!("Invalid SQLite URL: {}", e)))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to SQLite: {}", e)))?;

        let db = Self { pool };
        db.run_migrations().await?;

        info!(url = %url, "SQLite database initialized");
        Ok(db)
    }

    /// In-memory database (for testing)
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Underlying connection pool
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                registration_number TEXT NOT NULL UNIQUE,
                api_key TEXT NOT NULL UNIQUE,
                quota_limit INTEGER NOT NULL DEFAULT 50 CHECK (quota_limit >= 0),
                quota_used INTEGER NOT NULL DEFAULT 0 CHECK (quota_used >= 0),
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create accounts table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS api_usage_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER,
                api_key TEXT NOT NULL,
                endpoint TEXT NOT NULL,
                request_method TEXT NOT NULL,
                request_payload TEXT NOT NULL,
                response_payload TEXT NOT NULL,
                response_status INTEGER NOT NULL,
                used_at TEXT NOT NULL,
                ip_address TEXT,
                user_agent TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create api_usage_logs table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_usage_logs_used_at ON api_usage_logs(used_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create index: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS admins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                auth_token TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create admins table: {}", e)))?;

        debug!("SQLite schema initialized");
        Ok(())
    }
}

/// File path behind a `sqlite:` URL, if it names a file
fn file_path(url: &str) -> Option<&Path> {
    let rest = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next()?;
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(Path::new(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path_parsing() {
        assert_eq!(
            file_path("sqlite:data/quotagate.db?mode=rwc"),
            Some(Path::new("data/quotagate.db"))
        );
        assert_eq!(
            file_path("sqlite:///var/lib/q.db"),
            Some(Path::new("/var/lib/q.db"))
        );
        assert_eq!(file_path("sqlite::memory:"), None);
        assert_eq!(file_path("postgres://x"), None);
    }

    #[tokio::test]
    async fn test_in_memory_health() {
        let db = Database::in_memory().await.unwrap();
        db.health_check().await.unwrap();
    }
}
