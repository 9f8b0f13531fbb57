//! Question-answering handler
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use tracing::info;
use tracing::warn;

use super::AppState;
use crate::api::types::AskRequest;
use crate::api::types::AskResponse;
use crate::api::types::ErrorResponse;
use crate::rag::QaOutcome;

const MISSING_QUESTION: &str = "Question must be a non-empty string";

/// Answer a question (POST /api/ask)
pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Malformed ask request: {}", rejection.body_text());
            return bad_request(MISSING_QUESTION);
        }
    };

    let Some(question) = request.question() else {
        return bad_request(MISSING_QUESTION);
    };
    info!("POST /api/ask: {}", question);

    let outcome = state.service.ask(question).await;
    let status =
        StatusCode::from_u16(outcome.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    match outcome {
        QaOutcome::Answered { answer, .. } => (status, Json(AskResponse { answer })).into_response(),
        QaOutcome::Rejected { error } | QaOutcome::Failed { error } => {
            (status, Json(ErrorResponse { error })).into_response()
        }
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}
