//! Usage log API

use super::ApiError;
use crate::middleware::auth::RequireAdmin;
use axum::{
    extract::Query,
    routing::get,
    Extension, Json, Router,
};
use quotagate_core::{LogStore, UsageLogRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<i64>,
}

impl LogsQuery {
    fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub success: bool,
    pub logs: Vec<UsageLogRecord>,
}

/// Create log routes
pub fn logs_routes() -> Router {
    Router::new().route("/api/v3/api-log", get(list_logs))
}

async fn list_logs(
    RequireAdmin(_admin): RequireAdmin,
    Extension(logs): Extension<Arc<dyn LogStore>>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, ApiError> {
    let logs = logs
        .recent(query.effective_limit())
        .await
        .map_err(|e| ApiError::internal("Failed to fetch logs", e))?;

    Ok(Json(LogsResponse {
        success: true,
        logs,
    }))
}
