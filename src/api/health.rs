//! Health check endpoints with component-level diagnostics.
//!
//! Provides:
//! - `/health`: "healthy" + version (for load balancers)
//! - `/health/detailed`: per-component status (database, cache, provider)

use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use quotagate_core::{Database, DispatchPipeline};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use crate::middleware::auth::RequireAdmin;

/// Simple health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed health response with per-component checks
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub checks: HealthChecks,
}

/// All component health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: ComponentHealth,
    pub cache: ComponentHealth,
    pub provider: ComponentHealth,
}

/// Individual component health status
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ComponentHealth {
    fn healthy_with_details(latency_ms: u64, details: serde_json::Value) -> Self {
        Self {
            status: "healthy",
            latency_ms: Some(latency_ms),
            error: None,
            details: Some(details),
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy",
            latency_ms: None,
            error: Some(error),
            details: None,
        }
    }

    fn disabled(details: serde_json::Value) -> Self {
        Self {
            status: "disabled",
            latency_ms: None,
            error: None,
            details: Some(details),
        }
    }
}

/// Simple health check (for load balancers)
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Detailed health check (admin only)
async fn detailed_health_check(
    RequireAdmin(_admin): RequireAdmin,
    Extension(database): Extension<Database>,
    Extension(pipeline): Extension<Arc<DispatchPipeline>>,
) -> Json<DetailedHealthResponse> {
    let database_health = check_database(&database).await;
    let cache_health = check_cache(&pipeline).await;
    let provider_health = check_provider(&pipeline);

    let overall_status = overall([
        database_health.status,
        cache_health.status,
        provider_health.status,
    ]);

    Json(DetailedHealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            database: database_health,
            cache: cache_health,
            provider: provider_health,
        },
    })
}

fn overall(statuses: [&'static str; 3]) -> &'static str {
    let healthy = statuses.iter().filter(|s| **s == "healthy").count();
    let unhealthy = statuses.iter().filter(|s| **s == "unhealthy").count();

    if unhealthy == 0 {
        "healthy"
    } else if healthy > 0 {
        "degraded"
    } else {
        "unhealthy"
    }
}

async fn check_database(database: &Database) -> ComponentHealth {
    let start = Instant::now();
    match database.health_check().await {
        Ok(()) => ComponentHealth::healthy_with_details(
            start.elapsed().as_millis() as u64,
            json!({ "backend": "sqlite" }),
        ),
        Err(e) => ComponentHealth::unhealthy(e.to_string()),
    }
}

async fn check_cache(pipeline: &DispatchPipeline) -> ComponentHealth {
    let cache = pipeline.cache();
    let details = json!({ "backend": cache.backend_name() });
    if !cache.is_enabled() {
        return ComponentHealth::disabled(details);
    }

    let start = Instant::now();
    match cache.health().await {
        Ok(()) => ComponentHealth::healthy_with_details(start.elapsed().as_millis() as u64, details),
        Err(e) => ComponentHealth::unhealthy(e.to_string()),
    }
}

/// Configuration only; never calls the provider
fn check_provider(pipeline: &DispatchPipeline) -> ComponentHealth {
    let dispatcher = pipeline.dispatcher();
    let cooldown = pipeline.cooldown();
    ComponentHealth::healthy_with_details(
        0,
        json!({
            "provider": dispatcher.name(),
            "model": dispatcher.model(),
            "cooldown_ms": cooldown.window().as_millis() as u64,
            "cooldown_active": cooldown.is_busy(),
        }),
    )
}

/// Create health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::TestApp;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    #[test]
    fn test_overall_status() {
        assert_eq!(overall(["healthy", "healthy", "healthy"]), "healthy");
        assert_eq!(overall(["healthy", "disabled", "healthy"]), "healthy");
        assert_eq!(overall(["healthy", "unhealthy", "healthy"]), "degraded");
        assert_eq!(overall(["unhealthy", "unhealthy", "disabled"]), "unhealthy");
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = TestApp::new(Ok("B".to_string())).await;
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, json) = app.send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_detailed_health() {
        let app = TestApp::new(Ok("B".to_string())).await;
        let (status, json) = app
            .send(app.admin_request("GET", "/health/detailed", None))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["checks"]["database"]["status"], "healthy");
        assert_eq!(json["checks"]["cache"]["details"]["backend"], "memory");
        assert_eq!(json["checks"]["provider"]["details"]["model"], "fixed-model");
    }

    #[tokio::test]
    async fn test_detailed_health_requires_admin() {
        let app = TestApp::new(Ok("B".to_string())).await;
        let request = Request::builder()
            .uri("/health/detailed")
            .body(Body::empty())
            .unwrap();
        let (status, _) = app.send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_banner_without_web_ui() {
        let app = TestApp::new(Ok("B".to_string())).await;
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = tower::util::ServiceExt::oneshot(app.router.clone(), request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"Quotagate Gemini Gateway");
    }
}
