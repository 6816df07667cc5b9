//! Dashboard analytics API

use super::ApiError;
use crate::middleware::auth::RequireAdmin;
use axum::{routing::get, Extension, Json, Router};
use quotagate_core::{AccountStore, LogStore, UsageLogRecord};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Number of recent failures shown on the dashboard
const RECENT_ERRORS: i64 = 5;

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub total_users: i64,
    pub total_requests: i64,
    pub api_success_rate: SuccessRate,
    pub recent_errors: Vec<ErrorSummary>,
}

/// Percentages formatted with one decimal, e.g. `"66.7%"`
#[derive(Debug, Serialize)]
pub struct SuccessRate {
    pub successful: String,
    pub failed: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorSummary {
    pub id: i64,
    pub timestamp: String,
    pub error: String,
    pub code: i64,
    pub endpoint: String,
}

impl From<UsageLogRecord> for ErrorSummary {
    fn from(record: UsageLogRecord) -> Self {
        let error = match record.response_payload.get("error") {
            Some(Value::String(message)) => message.clone(),
            _ => record.response_payload.to_string(),
        };
        Self {
            id: record.id,
            timestamp: record.used_at.to_rfc3339(),
            error,
            code: record.response_status,
            endpoint: record.endpoint,
        }
    }
}

/// Create analytics routes
pub fn analytics_routes() -> Router {
    Router::new().route("/api/analytics", get(get_analytics))
}

async fn get_analytics(
    RequireAdmin(_admin): RequireAdmin,
    Extension(accounts): Extension<Arc<dyn AccountStore>>,
    Extension(logs): Extension<Arc<dyn LogStore>>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let total_users = accounts
        .count()
        .await
        .map_err(|e| ApiError::internal("Failed to count users", e))?;
    let analytics = logs
        .analytics(RECENT_ERRORS)
        .await
        .map_err(|e| ApiError::internal("Failed to compute analytics", e))?;

    Ok(Json(AnalyticsResponse {
        total_users,
        total_requests: analytics.total_requests,
        api_success_rate: SuccessRate {
            successful: format!("{:.1}%", analytics.success_rate()),
            failed: format!("{:.1}%", analytics.failure_rate()),
        },
        recent_errors: analytics
            .recent_errors
            .into_iter()
            .map(ErrorSummary::from)
            .collect(),
    }))
}
