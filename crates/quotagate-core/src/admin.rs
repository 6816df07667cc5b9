//! Admin operators
//!
//! Admins log in with email and bcrypt-hashed password and receive a UUID v4
//! bearer token. Logging in again replaces the previous token.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use subtle::ConstantTimeEq;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Admin operator
#[derive(Debug, Clone, Serialize)]
pub struct Admin {
    /// Primary key
    pub id: i64,
    /// Login email
    pub email: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// SQLite admin store
#[derive(Debug, Clone)]
pub struct AdminStore {
    pool: SqlitePool,
    hash_cost: u32,
}

impl AdminStore {
    /// Create a store on an already-migrated pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt cost
    #[must_use]
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Create an admin. Fails with `Conflict` if the email is taken.
    #[instrument(skip(self, password))]
    pub async fn create(&self, email: &str, password: &str) -> Result<Admin> {
        let cost = self.hash_cost;
        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| Error::Internal(e.to_string()))?
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;

        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO admins (email, password_hash, auth_token, created_at) VALUES (?, ?, NULL, ?)",
        )
        .bind(email)
        .bind(&hash)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        info!(email = %email, "Admin created");
        Ok(Admin {
            id: result.last_insert_rowid(),
            email: email.to_string(),
            created_at,
        })
    }

    /// Verify credentials and issue a new token. `None` on bad email or password.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT id, password_hash FROM admins WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            warn!(email = %email, "Admin login for unknown email");
            return Ok(None);
        };
        let id: i64 = row.get("id");
        let hash: String = row.get("password_hash");

        let password = password.to_string();
        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| Error::Internal(e.to_string()))?
            .unwrap_or(false);

        if !valid {
            warn!(email = %email, "Admin login with wrong password");
            return Ok(None);
        }

        let token = Uuid::new_v4().to_string();
        sqlx::query("UPDATE admins SET auth_token = ? WHERE id = ?")
            .bind(&token)
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!(admin_id = id, "Admin logged in");
        Ok(Some(token))
    }

    /// Resolve a bearer token to its admin
    pub async fn find_by_token(&self, token: &str) -> Result<Option<Admin>> {
        if token.is_empty() {
            return Ok(None);
        }

        let row = sqlx::query(
            "SELECT id, email, auth_token, created_at FROM admins WHERE auth_token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let stored: String = row.get("auth_token");
        if !bool::from(stored.as_bytes().ct_eq(token.as_bytes())) {
            return Ok(None);
        }
        row_to_admin(row).map(Some)
    }

    /// Number of admins
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM admins")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }
}

fn row_to_admin(row: SqliteRow) -> Result<Admin> {
    let created_at_str: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| Error::Serialization(format!("invalid timestamp: {e}")))?
        .with_timezone(&Utc);

    Ok(Admin {
        id: row.get("id"),
        email: row.get("email"),
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn store() -> AdminStore {
        let db = Database::in_memory().await.unwrap();
        AdminStore::new(db.pool().clone()).with_hash_cost(4)
    }

    #[tokio::test]
    async fn test_login_issues_token() {
        let store = store().await;
        let admin = store.create("ops@example.com", "hunter2").await.unwrap();

        let token = store
            .login("ops@example.com", "hunter2")
            .await
            .unwrap()
            .unwrap();
        assert!(Uuid::parse_str(&token).is_ok());

        let found = store.find_by_token(&token).await.unwrap().unwrap();
        assert_eq!(found.id, admin.id);
        assert_eq!(found.email, "ops@example.com");
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let store = store().await;
        store.create("ops@example.com", "hunter2").await.unwrap();

        assert!(store.login("ops@example.com", "wrong").await.unwrap().is_none());
        assert!(store.login("nobody@example.com", "hunter2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_relogin_replaces_token() {
        let store = store().await;
        store.create("ops@example.com", "pw").await.unwrap();

        let first = store.login("ops@example.com", "pw").await.unwrap().unwrap();
        let second = store.login("ops@example.com", "pw").await.unwrap().unwrap();

        assert_ne!(first, second);
        assert!(store.find_by_token(&first).await.unwrap().is_none());
        assert!(store.find_by_token(&second).await.unwrap().is_some());
        assert!(store.find_by_token("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = store().await;
        store.create("ops@example.com", "pw").await.unwrap();
        let err = store.create("ops@example.com", "pw2").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
