//! Admin authentication for Axum
//!
//! Every admin request must carry the static panel key in `apis-key` and a
//! login token in `Authorization: Bearer <token>`. Provides the
//! `RequireAdmin` extractor for handlers.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use quotagate_core::{Admin, AdminStore};
use serde::Serialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{error, warn};

/// Header carrying the panel key
pub const PANEL_KEY_HEADER: &str = "apis-key";

/// Panel key and token verification
pub struct AdminGuard {
    store: AdminStore,
    panel_key: String,
}

impl AdminGuard {
    /// Create a guard. An empty panel key rejects every request.
    pub fn new(store: AdminStore, panel_key: impl Into<String>) -> Self {
        Self {
            store,
            panel_key: panel_key.into(),
        }
    }

    /// Admin store (login, token lookup)
    pub fn store(&self) -> &AdminStore {
        &self.store
    }

    fn panel_key_matches(&self, presented: &str) -> bool {
        !self.panel_key.is_empty()
            && bool::from(presented.as_bytes().ct_eq(self.panel_key.as_bytes()))
    }
}

/// JSON error response for auth failures
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    success: bool,
    message: String,
}

/// Auth rejection type
#[derive(Debug)]
pub struct AuthRejection {
    status: StatusCode,
    message: String,
}

impl AuthRejection {
    fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(AuthErrorResponse {
                success: false,
                message: self.message,
            }),
        )
            .into_response()
    }
}

/// Axum extractor that requires an authenticated admin.
pub struct RequireAdmin(pub Admin);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let guard = parts
            .extensions
            .get::<Arc<AdminGuard>>()
            .cloned()
            .ok_or_else(|| {
                error!("AdminGuard not configured");
                AuthRejection::internal()
            })?;

        let panel_key = header_str(parts, PANEL_KEY_HEADER).unwrap_or_default();
        if !guard.panel_key_matches(panel_key) {
            warn!("Admin request with invalid panel key");
            return Err(AuthRejection::unauthorized("Invalid API key"));
        }

        let token = extract_bearer(parts)
            .ok_or_else(|| AuthRejection::unauthorized("Access denied. No token provided."))?;

        match guard.store().find_by_token(&token).await {
            Ok(Some(admin)) => Ok(RequireAdmin(admin)),
            Ok(None) => Err(AuthRejection::unauthorized("Invalid or expired token")),
            Err(e) => {
                error!(error = %e, "Admin token lookup failed");
                Err(AuthRejection::internal())
            }
        }
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

/// Extract `Authorization: Bearer <token>`
fn extract_bearer(parts: &Parts) -> Option<String> {
    header_str(parts, "authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}
