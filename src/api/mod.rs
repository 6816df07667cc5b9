//! Web API module for Quotagate
//!
//! Provides REST API endpoints for:
//! - The gateway itself (`/ask-gemini` and the legacy `/api/v3/modal/ai`)
//! - Admin login and token verification
//! - Account management and quota increases
//! - Usage logs and analytics
//! - Health checks

pub mod analytics;
pub mod ask;
pub mod auth;
pub mod health;
pub mod logs;
pub mod users;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use std::fmt::Display;
use tracing::error;

pub use analytics::analytics_routes;
pub use ask::ask_routes;
pub use auth::auth_routes;
pub use health::health_routes;
pub use logs::logs_routes;
pub use users::users_routes;

/// Create the admin API router
pub fn admin_router() -> Router {
    Router::new()
        .merge(auth_routes())
        .merge(users_routes())
        .merge(analytics_routes())
        .merge(logs_routes())
}

/// Admin API failure, rendered as `{success: false, message}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Log `err` and answer with a generic 500
    pub fn internal(context: &str, err: impl Display) -> Self {
        error!(error = %err, "{}", context);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "message": self.message })),
        )
            .into_response()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::server::{build_app, Services};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use quotagate_core::{
        AdminStore, CacheSettings, CooldownGuard, Database, MemoryCache, ResponseCache,
    };
    use quotagate_llm::{DispatchResult, Dispatcher};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    pub const PANEL_KEY: &str = "test-panel-key-0123456789";
    pub const ADMIN_EMAIL: &str = "admin@example.com";
    pub const ADMIN_PASSWORD: &str = "correct horse";

    /// Dispatcher that always returns the same result
    pub struct FixedDispatcher {
        reply: DispatchResult,
        pub calls: AtomicUsize,
    }

    impl FixedDispatcher {
        pub fn new(reply: DispatchResult) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Dispatcher for FixedDispatcher {
        fn name(&self) -> &str {
            "fixed"
        }

        fn model(&self) -> &str {
            "fixed-model"
        }

        async fn dispatch(&self, _prompt: &str) -> DispatchResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    pub struct TestApp {
        pub services: Services,
        pub router: Router,
        pub dispatcher: Arc<FixedDispatcher>,
        pub admin_token: String,
    }

    impl TestApp {
        pub async fn new(reply: DispatchResult) -> Self {
            Self::with_window(reply, Duration::ZERO).await
        }

        pub async fn with_window(reply: DispatchResult, window: Duration) -> Self {
            let database = Database::in_memory().await.unwrap();
            let admins = AdminStore::new(database.pool().clone()).with_hash_cost(4);
            admins.create(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
            let admin_token = admins
                .login(ADMIN_EMAIL, ADMIN_PASSWORD)
                .await
                .unwrap()
                .unwrap();

            let dispatcher = Arc::new(FixedDispatcher::new(reply));
            let cache = ResponseCache::new(Arc::new(MemoryCache::new()), CacheSettings::default());
            let services = Services::assemble(
                database,
                cache,
                CooldownGuard::new(window),
                dispatcher.clone(),
                PANEL_KEY.to_string(),
                50,
            );
            let router = build_app(&services, None);

            Self {
                services,
                router,
                dispatcher,
                admin_token,
            }
        }

        pub fn dispatch_calls(&self) -> usize {
            self.dispatcher.calls.load(Ordering::SeqCst)
        }

        /// Send a request; the body is `Value::Null` when it is not JSON
        pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, json)
        }

        /// Request carrying both the panel key and the bearer token
        pub fn admin_request(&self, method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
            Request::builder()
                .method(method)
                .uri(uri)
                .header("apis-key", PANEL_KEY)
                .header("authorization", format!("Bearer {}", self.admin_token))
                .header("content-type", "application/json")
                .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
                .unwrap()
        }
    }
}
