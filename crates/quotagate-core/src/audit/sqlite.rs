//! SQLite audit log store

use super::{Analytics, LogStore, NewUsageLog, UsageLogRecord};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::instrument;

const SELECT_COLUMNS: &str = "SELECT id, user_id, api_key, endpoint, request_method, \
     request_payload, response_payload, response_status, used_at, ip_address, user_agent \
     FROM api_usage_logs";

/// SQLite-backed [`LogStore`]
#[derive(Debug, Clone)]
pub struct SqliteLogStore {
    pool: SqlitePool,
}

impl SqliteLogStore {
    /// Create a store on an already-migrated pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Stored text back to JSON; non-JSON text is kept as a string
fn parse_payload(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn row_to_record(row: SqliteRow) -> Result<UsageLogRecord> {
    let used_at_str: String = row.get("used_at");
    let used_at = DateTime::parse_from_rfc3339(&used_at_str)
        .map_err(|e| Error::Serialization(format!("invalid timestamp: {e}")))?
        .with_timezone(&Utc);
    let request_payload: String = row.get("request_payload");
    let response_payload: String = row.get("response_payload");

    Ok(UsageLogRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        api_key: row.get("api_key"),
        endpoint: row.get("endpoint"),
        request_method: row.get("request_method"),
        request_payload: parse_payload(&request_payload),
        response_payload: parse_payload(&response_payload),
        response_status: row.get("response_status"),
        used_at,
        ip_address: row.get("ip_address"),
        user_agent: row.get("user_agent"),
    })
}

#[async_trait]
impl LogStore for SqliteLogStore {
    #[instrument(skip(self, entry), fields(endpoint = %entry.endpoint, status = entry.response_status))]
    async fn append(&self, entry: NewUsageLog) -> Result<i64> {
        let request_payload = serde_json::to_string(&entry.request_payload)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        let response_payload = serde_json::to_string(&entry.response_payload)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO api_usage_logs (
                user_id, api_key, endpoint, request_method, request_payload,
                response_payload, response_status, used_at, ip_address, user_agent
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.api_key)
        .bind(&entry.endpoint)
        .bind(&entry.request_method)
        .bind(&request_payload)
        .bind(&response_payload)
        .bind(i64::from(entry.response_status))
        .bind(entry.used_at.to_rfc3339())
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<UsageLogRecord>> {
        let rows = sqlx::query(&format!("{} ORDER BY id DESC LIMIT ?", SELECT_COLUMNS))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_record).collect()
    }

    async fn analytics(&self, error_limit: i64) -> Result<Analytics> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN response_status BETWEEN 200 AND 299 THEN 1 ELSE 0 END), 0) AS successful
            FROM api_usage_logs
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        let total_requests: i64 = row.get("total");
        let successful: i64 = row.get("successful");

        let rows = sqlx::query(&format!(
            "{} WHERE response_status >= 400 ORDER BY id DESC LIMIT ?",
            SELECT_COLUMNS
        ))
        .bind(error_limit)
        .fetch_all(&self.pool)
        .await?;
        let recent_errors = rows
            .into_iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>>>()?;

        Ok(Analytics {
            total_requests,
            successful,
            failed: total_requests - successful,
            recent_errors,
        })
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
