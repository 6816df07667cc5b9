//! SQLite account store

use super::{generate_api_key, Account, AccountStore, NewAccount};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::{debug, instrument};

const SELECT_COLUMNS: &str =
    "SELECT id, name, registration_number, api_key, quota_limit, quota_used, created_at FROM accounts";

/// SQLite-backed [`AccountStore`]
#[derive(Debug, Clone)]
pub struct SqliteAccountStore {
    pool: SqlitePool,
}

impl SqliteAccountStore {
    /// Create a store on an already-migrated pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Decode one column; a type mismatch is an error, not a panic
fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| Error::Serialization(format!("column {name}: {e}")))
}

fn row_to_account(row: SqliteRow) -> Result<Account> {
    let created_at_str: String = column(&row, "created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| Error::Serialization(format!("invalid timestamp: {e}")))?
        .with_timezone(&Utc);

    Ok(Account {
        id: column(&row, "id")?,
        name: column(&row, "name")?,
        registration_number: column(&row, "registration_number")?,
        api_key: column(&row, "api_key")?,
        quota_limit: column(&row, "quota_limit")?,
        quota_used: column(&row, "quota_used")?,
        created_at,
    })
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    #[instrument(skip(self))]
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Account>> {
        let row = sqlx::query(&format!("{} WHERE registration_number = ?", SELECT_COLUMNS))
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_account).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_account).transpose()
    }

    #[instrument(skip(self))]
    async fn increment_usage(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET quota_used = quota_used + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(account_id = id, "Quota usage incremented");
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn increase_limit(&self, id: i64, amount: i64) -> Result<bool> {
        if amount <= 0 {
            return Err(Error::InvalidInput(format!(
                "quota increase must be positive, got {amount}"
            )));
        }

        // SQLite silently widens an overflowing sum to REAL, so the bound is
        // checked in the same statement.
        let result = sqlx::query(
            "UPDATE accounts SET quota_limit = quota_limit + ?1 \
             WHERE id = ?2 AND quota_limit <= 9223372036854775807 - ?1",
        )
        .bind(amount)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        match self.find_by_id(id).await? {
            Some(account) => Err(Error::InvalidInput(format!(
                "quota limit {} + {amount} overflows",
                account.quota_limit
            ))),
            None => Ok(false),
        }
    }

    #[instrument(skip(self, account), fields(registration_number = %account.registration_number))]
    async fn create(&self, account: NewAccount) -> Result<Account> {
        if self
            .find_by_identifier(&account.registration_number)
            .await?
            .is_some()
        {
            return Err(Error::Conflict(format!(
                "registration number {} already exists",
                account.registration_number
            )));
        }

        let api_key = generate_api_key();
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO accounts (name, registration_number, api_key, quota_limit, quota_used, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&account.name)
        .bind(&account.registration_number)
        .bind(&api_key)
        .bind(account.quota_limit)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Account {
            id: result.last_insert_rowid(),
            name: account.name,
            registration_number: account.registration_number,
            api_key,
            quota_limit: account.quota_limit,
            quota_used: 0,
            created_at,
        })
    }

    async fn list(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(&format!("{} ORDER BY id ASC", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_account).collect()
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        column(&row, "count")
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
