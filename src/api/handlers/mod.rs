//! API request handlers

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Json;

use crate::api::types::ErrorResponse;
use crate::api::types::HealthResponse;
use crate::rag::QaService;

pub mod ask;

pub use ask::ask;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QaService>,
}

/// Health check handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Any method other than the one a route accepts
pub async fn method_not_allowed() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse::new("Method not allowed")),
    )
}
