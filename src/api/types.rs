//! API request and response types

use serde::Deserialize;
use serde::Serialize;

/// Body of `POST /api/ask`
///
/// Kept loose so that a missing or non-string `question` can be reported
/// with our own error body instead of an extractor rejection.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: serde_json::Value,
}

impl AskRequest {
    /// The question, if it was sent as a string
    pub fn question(&self) -> Option<&str> {
        self.question.as_str()
    }
}

/// Successful answer
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AskResponse {
    pub answer: String,
}

/// Any non-200 response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
