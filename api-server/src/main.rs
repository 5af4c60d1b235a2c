//! URLScan API Server
//!
//! JSON front end over the URL risk analyzer.
//!
//! # Routes
//!
//! - `GET  /health`       liveness
//! - `POST /api/analyze`  `{"url": "..."}` -> analysis report
//! - `GET  /api/model`    classifier status

mod config;
mod handlers;
mod error;


use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::sync::Arc;

use anyhow::Context;
use urlscan_core::UrlAnalyzer;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "urlscan_api=debug,urlscan_core=info,tower_http=debug".into());
    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("URLScan API Server starting ({})...", config.environment);

    // Blocking HTTP client and model load/train stay off the async workers
    let analyzer = tokio::task::spawn_blocking(|| -> anyhow::Result<UrlAnalyzer> {
        let analyzer = UrlAnalyzer::from_env().context("Failed to build HTTP client")?;
        if !analyzer.classifier().ensure_ready() {
            tracing::warn!("Classifier not ready, serving fail-safe verdicts");
        }
        Ok(analyzer)
    })
    .await??;

    // Build application state
    let state = AppState {
        analyzer: Arc::new(analyzer),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = config.addr();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<UrlAnalyzer>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/analyze", post(handlers::analyze::analyze))
        .route("/api/model", get(handlers::model::status))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
