//! Text-generation client with retry-on-loading semantics
//!
//! Hosted inference backends answer with `{"error": "... is currently loading"}`
//! while a cold model warms up. That signal, and only that signal, is retried
//! after a fixed pause, up to `max_attempts` calls in total. Any other backend
//! error or an unrecognised response body ends the request immediately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use super::clock::Sleeper;
use super::clock::TokioSleeper;
use super::types::AttemptOutcome;
use super::types::GenerationAttempt;
use super::types::GenerationParams;
use super::types::GenerationRequest;
use super::TextGenerator;
use crate::config::AppConfig;
use crate::errors::QaError;
use crate::Result;

/// Substring of the backend's error message that marks a cold model
const LOADING_SIGNAL: &str = "currently loading";

/// Retry policy for the loading signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(5),
        }
    }
}

/// States of one generation request
#[derive(Debug)]
enum RetryState {
    Attempting { attempt: u32 },
    BackingOff { attempt: u32, reason: String },
    Finished(Result<String>),
}

/// Client for a hosted text-generation model
pub struct GenerationClient {
    endpoint: String,
    api_token: Option<String>,
    policy: RetryPolicy,
    client: Client,
    sleeper: Arc<dyn Sleeper>,
}

impl GenerationClient {
    /// Create a new generation client sleeping on the tokio timer
    pub fn new(endpoint: String, api_token: Option<String>, policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| QaError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint,
            api_token,
            policy,
            client,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Create a client from the `[generation]` section and the shared token
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.generation.endpoint.clone(),
            config.api_token.clone(),
            RetryPolicy {
                max_attempts: config.generation.max_attempts,
                backoff: config.backoff_interval(),
            },
        )
    }

    /// Replace the clock used between attempts
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Perform exactly one call to the backend
    async fn attempt(&self, prompt: &str, params: &GenerationParams) -> AttemptOutcome {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&GenerationRequest {
                inputs: prompt,
                parameters: params.to_wire(),
            });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                return AttemptOutcome::Fatal(QaError::BackendUnavailable(format!(
                    "generation request failed: {e}"
                )))
            }
        };

        let status = response.status();
        match response.text().await {
            Ok(body) => classify_response(status, &body),
            Err(e) => AttemptOutcome::Fatal(QaError::BackendUnavailable(format!(
                "generation body unreadable: {e}"
            ))),
        }
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        params.validate()?;

        let max_attempts = self.policy.max_attempts.max(1);
        let mut state = RetryState::Attempting { attempt: 1 };

        loop {
            state = match state {
                RetryState::Attempting { attempt } => {
                    debug!("Generation attempt {}/{}", attempt, max_attempts);
                    let record = GenerationAttempt {
                        prompt,
                        attempt_number: attempt,
                        outcome: self.attempt(prompt, params).await,
                    };
                    debug!("{}", record.summary());
                    match record.outcome {
                        AttemptOutcome::Success(text) => RetryState::Finished(Ok(text)),
                        AttemptOutcome::Retryable(reason) if record.attempt_number < max_attempts => {
                            RetryState::BackingOff {
                                attempt: record.attempt_number,
                                reason,
                            }
                        }
                        AttemptOutcome::Retryable(reason) => {
                            warn!(
                                "Model still loading after {} attempts: {}",
                                record.attempt_number, reason
                            );
                            RetryState::Finished(Err(QaError::ModelWarmingTimeout {
                                attempts: record.attempt_number,
                            }))
                        }
                        AttemptOutcome::Fatal(err) => RetryState::Finished(Err(err)),
                    }
                }
                RetryState::BackingOff { attempt, reason } => {
                    warn!(
                        "Attempt {} reported loading ({}), retrying in {:?}",
                        attempt, reason, self.policy.backoff
                    );
                    self.sleeper.sleep(self.policy.backoff).await;
                    RetryState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                RetryState::Finished(result) => return result,
            };
        }
    }
}

/// Decide what a single backend response means
pub fn classify_response(status: StatusCode, body: &str) -> AttemptOutcome {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return if status.is_success() {
            AttemptOutcome::Fatal(QaError::UnexpectedResponse(format!(
                "generation response is not JSON: {}",
                truncate(body)
            )))
        } else {
            AttemptOutcome::Fatal(QaError::BackendUnavailable(format!(
                "generation API error ({status}): {}",
                truncate(body)
            )))
        };
    };

    if let Some(message) = value.get("error").and_then(Value::as_str) {
        if message.to_lowercase().contains(LOADING_SIGNAL) {
            return AttemptOutcome::Retryable(message.to_string());
        }
        return AttemptOutcome::Fatal(QaError::BackendUnavailable(format!(
            "generation API error ({status}): {message}"
        )));
    }

    if !status.is_success() {
        return AttemptOutcome::Fatal(QaError::BackendUnavailable(format!(
            "generation API error ({status}): {}",
            truncate(body)
        )));
    }

    let generated = match &value {
        Value::Array(items) => items.first().and_then(|item| item.get("generated_text")),
        Value::Object(_) => value.get("generated_text"),
        _ => None,
    };

    match generated.and_then(Value::as_str) {
        Some(text) => AttemptOutcome::Success(text.to_string()),
        None => AttemptOutcome::Fatal(QaError::UnexpectedResponse(
            "generation response has no generated_text".to_string(),
        )),
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::body_partial_json;
    use wiremock::matchers::header;
    use wiremock::matchers::method;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;

    use super::*;
    use crate::llm::clock::RecordingSleeper;

    fn loading() -> ResponseTemplate {
        ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "error": "Model google/flan-t5-base is currently loading",
            "estimated_time": 20.0
        }))
    }

    fn generated(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "generated_text": text }]))
    }

    fn client_for(server: &MockServer, sleeper: Arc<RecordingSleeper>) -> GenerationClient {
        GenerationClient::new(
            format!("{}/generate", server.uri()),
            Some("hf_test".to_string()),
            RetryPolicy::default(),
        )
        .unwrap()
        .with_sleeper(sleeper)
    }

    // ====== Classification Tests ======

    #[test]
    fn test_classify_success_array() {
        let outcome = classify_response(StatusCode::OK, r#"[{"generated_text": "Rose and Lily"}]"#);
        assert!(matches!(outcome, AttemptOutcome::Success(ref t) if t == "Rose and Lily"));
    }

    #[test]
    fn test_classify_success_object() {
        let outcome = classify_response(StatusCode::OK, r#"{"generated_text": "Lily"}"#);
        assert!(matches!(outcome, AttemptOutcome::Success(ref t) if t == "Lily"));
    }

    #[test]
    fn test_classify_loading() {
        let outcome = classify_response(
            StatusCode::SERVICE_UNAVAILABLE,
            r#"{"error": "Model x is currently loading", "estimated_time": 12.5}"#,
        );
        assert!(matches!(outcome, AttemptOutcome::Retryable(_)));
    }

    #[test]
    fn test_classify_other_error_is_fatal() {
        let outcome =
            classify_response(StatusCode::BAD_REQUEST, r#"{"error": "Input is too long"}"#);
        assert!(matches!(
            outcome,
            AttemptOutcome::Fatal(QaError::BackendUnavailable(_))
        ));
    }

    #[test]
    fn test_classify_missing_field_is_unexpected() {
        let outcome = classify_response(StatusCode::OK, r#"[{"summary_text": "nope"}]"#);
        assert!(matches!(
            outcome,
            AttemptOutcome::Fatal(QaError::UnexpectedResponse(_))
        ));
        let outcome = classify_response(StatusCode::OK, "[]");
        assert!(matches!(
            outcome,
            AttemptOutcome::Fatal(QaError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_classify_non_json() {
        assert!(matches!(
            classify_response(StatusCode::OK, "<html>"),
            AttemptOutcome::Fatal(QaError::UnexpectedResponse(_))
        ));
        assert!(matches!(
            classify_response(StatusCode::BAD_GATEWAY, "<html>"),
            AttemptOutcome::Fatal(QaError::BackendUnavailable(_))
        ));
    }

    // ====== Retry Loop Tests ======

    #[tokio::test]
    async fn test_loading_twice_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(loading())
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(generated("The girls' hostels are Rose and Lily."))
            .expect(1)
            .mount(&server)
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let text = client_for(&server, sleeper.clone())
            .generate("prompt", &GenerationParams::default())
            .await
            .unwrap();

        assert_eq!(text, "The girls' hostels are Rose and Lily.");
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_secs(5), Duration::from_secs(5)]
        );
    }

    #[tokio::test]
    async fn test_always_loading_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(loading())
            .expect(3)
            .mount(&server)
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let err = client_for(&server, sleeper.clone())
            .generate("prompt", &GenerationParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, QaError::ModelWarmingTimeout { attempts: 3 }));
        // No pause after the final attempt
        assert_eq!(sleeper.recorded().len(), 2);
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({ "error": "Authorization header is invalid" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let err = client_for(&server, sleeper.clone())
            .generate("prompt", &GenerationParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, QaError::BackendUnavailable(_)));
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "foo": 1 })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, Arc::new(RecordingSleeper::new()))
            .generate("prompt", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QaError::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn test_request_body_and_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer hf_test"))
            .and(body_partial_json(serde_json::json!({
                "inputs": "Context: x\n\nQuestion: y\n\nAnswer:",
                "parameters": { "max_new_tokens": 150, "stop": ["Question:"] }
            })))
            .respond_with(generated("ok answer"))
            .expect(1)
            .mount(&server)
            .await;

        let params = GenerationParams {
            stop_sequences: ["Question:".to_string()].into_iter().collect(),
            ..GenerationParams::default()
        };
        let text = client_for(&server, Arc::new(RecordingSleeper::new()))
            .generate("Context: x\n\nQuestion: y\n\nAnswer:", &params)
            .await
            .unwrap();
        assert_eq!(text, "ok answer");
    }

    #[tokio::test]
    async fn test_invalid_params_rejected_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(generated("never"))
            .expect(0)
            .mount(&server)
            .await;

        let params = GenerationParams {
            top_p: 0.0,
            ..GenerationParams::default()
        };
        let err = client_for(&server, Arc::new(RecordingSleeper::new()))
            .generate("prompt", &params)
            .await
            .unwrap_err();
        assert!(matches!(err, QaError::InvalidInput(_)));
    }
}
