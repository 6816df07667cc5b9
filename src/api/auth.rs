//! Admin login API
//!
//! - `POST /api/admin/login` exchanges email and password for a bearer token
//! - `GET /api/admin/verify-token` answers 200 when the token is still valid

use super::ApiError;
use crate::middleware::auth::{AdminGuard, RequireAdmin};
use axum::{
    extract::rejection::JsonRejection,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub auth_token: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
}

/// Create admin auth routes
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/admin/login", post(login))
        .route("/api/admin/verify-token", get(verify_token))
}

async fn login(
    Extension(guard): Extension<Arc<AdminGuard>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = body.map_err(|_| ApiError::bad_request("Email and password are required."))?;

    let (email, password) = match (request.email, request.password) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => return Err(ApiError::bad_request("Email and password are required.")),
    };

    match guard.store().login(email.trim(), &password).await {
        Ok(Some(token)) => {
            info!(email = %email.trim(), "Admin logged in");
            Ok(Json(LoginResponse {
                success: true,
                auth_token: token,
            }))
        }
        Ok(None) => {
            warn!(email = %email.trim(), "Admin login failed");
            Err(ApiError::unauthorized("Invalid email or password."))
        }
        Err(e) => Err(ApiError::internal("Admin login failed", e)),
    }
}

async fn verify_token(RequireAdmin(_admin): RequireAdmin) -> Json<VerifyResponse> {
    Json(VerifyResponse { success: true })
}
