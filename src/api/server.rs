//! HTTP server implementation

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::database::ContextStore;
use crate::rag::QaService;
use crate::Result;

/// Assemble the full application router
///
/// `request_timeout` bounds each request, including the generation retry
/// stall; expiry answers 408.
pub fn build_app(state: AppState, request_timeout: Duration, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .nest("/api", routes::api_routes(state))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Start the API server and block until Ctrl-C
pub async fn serve_api(config: &AppConfig) -> Result<()> {
    info!("🚀 Starting uniqa API server...");

    // The store is created once here and shared; it connects on first use
    let store = Arc::new(ContextStore::from_config(config));
    let service = Arc::new(QaService::from_config(config, store.clone())?);
    let state = AppState { service };

    let app = build_app(state, config.request_timeout(), config.server.cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /api/health  - Health check");
    info!("  POST /api/ask     - Answer a question");
    info!(
        "Similarity threshold: {:.2}, request timeout: {:?}",
        config.retrieval.threshold,
        config.request_timeout()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
