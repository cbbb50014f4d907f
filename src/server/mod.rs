//! Web dashboard: weight chart, folder monitor and the JSON API behind them.

pub mod api;
pub mod error;
pub mod pages;
pub mod state;

pub use state::{AppState, ServerSettings};

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the dashboard router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/monitor", get(pages::monitor))
        .route("/health", get(api::health))
        .route("/api/config", get(api::config))
        .route("/api/monitor", get(api::monitor))
        .route("/api/rename_file", post(api::rename_file))
        .route("/api/transfer_file", post(api::transfer_file))
        .route("/api/delete_file", post(api::delete_file))
        .route("/api/delete_source_file", post(api::delete_source_file))
        .route("/api/run_fusion_evaluator", post(api::run_fusion_evaluator))
        .route("/api/update_weight", post(api::update_weight))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the dashboard's listen address.
pub async fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("dashboard listening on http://{}", addr);
    Ok(listener)
}

/// Serve the dashboard on `listener` until the process is stopped.
pub async fn serve(listener: TcpListener, settings: ServerSettings) -> anyhow::Result<()> {
    info!(
        config = %settings.config_path.display(),
        source = %settings.source_dir.display(),
        target = %settings.target_dir.display(),
        "starting dashboard"
    );
    let state = Arc::new(AppState::new(settings)?);
    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}
