//! Server initialization and main run loop

use super::init_stores::{init_services, Services};
use super::loader::load_config;
use super::validation::validate_production_config;
use anyhow::{Context, Result};
use axum::{routing::get, Extension, Router};
use std::net::SocketAddr;
use std::path::Path;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};

/// Build the HTTP router over `services`
pub fn build_app(services: &Services, web_ui_dir: Option<&Path>) -> Router {
    let app = Router::new()
        // Health endpoints (/health public for LB, /health/detailed requires admin auth)
        .merge(crate::api::health_routes())
        // Gateway endpoints
        .merge(crate::api::ask_routes())
        // Admin API (auth applied per-handler via RequireAdmin extractor)
        .merge(crate::api::admin_router())
        .layer(Extension(services.pipeline.clone()))
        .layer(Extension(services.accounts.clone()))
        .layer(Extension(services.logs.clone()))
        .layer(Extension(services.admin.clone()))
        .layer(Extension(services.database.clone()))
        .layer(Extension(crate::api::users::QuotaDefaults {
            default_limit: services.default_quota,
        }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    match web_ui_dir {
        Some(dir) => {
            // Serve static files, fallback to index.html for SPA routing
            let serve_dir = ServeDir::new(dir)
                .append_index_html_on_directories(true)
                .fallback(tower_http::services::ServeFile::new(dir.join("index.html")));
            app.fallback_service(serve_dir)
        }
        None => app.route("/", get(|| async { "Quotagate Gemini Gateway" })),
    }
}

/// Run the server
pub async fn run() -> Result<()> {
    info!("Starting Quotagate v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config().context("Failed to load configuration")?;
    info!("Configuration loaded");

    validate_production_config(&config)?;

    let services = init_services(&config).await?;

    let web_ui_dir = config
        .server
        .web_ui_dir
        .as_deref()
        .map(Path::new)
        .filter(|dir| {
            let exists = dir.exists();
            if !exists {
                warn!("Web UI directory {} not found, not serving it", dir.display());
            }
            exists
        });
    if let Some(dir) = web_ui_dir {
        info!("Web UI enabled: serving from {}", dir.display());
    }

    let app = build_app(&services, web_ui_dir);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server error")?;

    info!("Draining background writes...");
    services.pipeline.shutdown().await;

    info!("Quotagate shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
