//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create the REST API router (mounted under `/api`)
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Question answering; every other method gets a JSON 405
        .route(
            "/ask",
            post(handlers::ask).fallback(handlers::method_not_allowed),
        )
        .with_state(state)
}
