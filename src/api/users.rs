//! Account management API
//!
//! - `POST /api/users/create`
//! - `GET /api/users`
//! - `POST /api/users/increase-quota`

use super::ApiError;
use crate::middleware::auth::RequireAdmin;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use quotagate_core::{Account, AccountStore, Error as CoreError, NewAccount};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Quota applied when a create request omits `api_limit`
#[derive(Debug, Clone, Copy)]
pub struct QuotaDefaults {
    pub default_limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub reg_no: Option<String>,
    pub api_limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub success: bool,
    pub message: String,
    pub user_id: i64,
    pub api_key: String,
}

/// Account as listed to the dashboard
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub registration_number: String,
    pub api_limit: i64,
    pub api_used: i64,
}

impl From<Account> for UserView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            registration_number: account.registration_number,
            api_limit: account.quota_limit,
            api_used: account.quota_used,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<UserView>,
}

/// Both fields accept a JSON number or a numeric string
#[derive(Debug, Deserialize)]
pub struct IncreaseQuotaRequest {
    pub user_id: Option<Value>,
    pub increase_amount: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Create account routes
pub fn users_routes() -> Router {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/create", post(create_user))
        .route("/api/users/increase-quota", post(increase_quota))
}

async fn create_user(
    RequireAdmin(admin): RequireAdmin,
    Extension(accounts): Extension<Arc<dyn AccountStore>>,
    Extension(defaults): Extension<QuotaDefaults>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateUserResponse>), ApiError> {
    let Json(request) =
        body.map_err(|_| ApiError::bad_request("Name and registration number are required."))?;

    let name = non_blank(request.name);
    let reg_no = non_blank(request.reg_no);
    let (Some(name), Some(reg_no)) = (name, reg_no) else {
        return Err(ApiError::bad_request(
            "Name and registration number are required.",
        ));
    };

    let limit = request.api_limit.unwrap_or(defaults.default_limit);
    if limit < 0 {
        return Err(ApiError::bad_request("API limit must not be negative."));
    }

    let account = accounts
        .create(NewAccount::new(name, reg_no).with_limit(limit))
        .await
        .map_err(|e| match e {
            CoreError::Conflict(_) => ApiError::conflict("Registration number already exists"),
            other => ApiError::internal("Failed to create user", other),
        })?;

    info!(
        admin = %admin.email,
        user_id = account.id,
        registration_number = %account.registration_number,
        limit,
        "User created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            success: true,
            message: "User created successfully".to_string(),
            user_id: account.id,
            api_key: account.api_key,
        }),
    ))
}

async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    Extension(accounts): Extension<Arc<dyn AccountStore>>,
) -> Result<Json<UsersResponse>, ApiError> {
    let users = accounts
        .list()
        .await
        .map_err(|e| ApiError::internal("Failed to list users", e))?;

    Ok(Json(UsersResponse {
        success: true,
        users: users.into_iter().map(UserView::from).collect(),
    }))
}

async fn increase_quota(
    RequireAdmin(admin): RequireAdmin,
    Extension(accounts): Extension<Arc<dyn AccountStore>>,
    body: Result<Json<IncreaseQuotaRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = body.map_err(|_| ApiError::bad_request("Invalid request body."))?;

    let user_id = request
        .user_id
        .as_ref()
        .and_then(as_integer)
        .ok_or_else(|| ApiError::bad_request("A valid user_id is required."))?;
    let amount = request
        .increase_amount
        .as_ref()
        .and_then(as_integer)
        .filter(|amount| *amount > 0)
        .ok_or_else(|| ApiError::bad_request("Increase amount must be a positive number."))?;

    let updated = accounts
        .increase_limit(user_id, amount)
        .await
        .map_err(|e| match e {
            CoreError::InvalidInput(_) => ApiError::bad_request("Increase amount is too large."),
            other => ApiError::internal("Failed to increase quota", other),
        })?;
    if !updated {
        return Err(ApiError::not_found("User not found"));
    }

    info!(admin = %admin.email, user_id, amount, "Quota increased");

    Ok(Json(MessageResponse {
        success: true,
        message: format!("API limit increased by {}", amount),
    }))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Integer from a JSON number or numeric string
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
