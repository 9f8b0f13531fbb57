//! HTTP client for the feature-extraction inference backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::payload::parse_embedding_body;
use super::text_preprocessing::preprocess_text_for_embedding;
use super::Embedder;
use crate::config::AppConfig;
use crate::errors::QaError;
use crate::models::Embedding;
use crate::Result;

/// Client for generating embeddings from a hosted feature-extraction model
pub struct EmbeddingClient {
    model: String,
    endpoint: String,
    api_token: Option<String>,
    client: Client,
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    model: &'a str,
    inputs: &'a str,
}

impl EmbeddingClient {
    /// Create a new embedding client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(model: String, endpoint: String, api_token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| QaError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            model,
            endpoint,
            api_token,
            client,
        })
    }

    /// Create a client from the `[embeddings]` section and the shared token
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.embeddings.model.clone(),
            config.embeddings.endpoint.clone(),
            config.api_token.clone(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request(&self, text: &str) -> Result<Embedding> {
        debug!("Calling embeddings API: {}", self.endpoint);

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&FeatureExtractionRequest {
                model: &self.model,
                inputs: text,
            });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| QaError::BackendUnavailable(format!("embedding request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| QaError::BackendUnavailable(format!("embedding body unreadable: {e}")))?;

        if !status.is_success() {
            return Err(QaError::BackendUnavailable(format!(
                "embedding API error ({status}): {body}"
            )));
        }

        parse_embedding_body(&body)
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let processed = preprocess_text_for_embedding(text)?;
        let embedding = self.request(&processed).await?;
        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }
}
