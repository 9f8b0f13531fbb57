//! Normalization of feature-extraction response bodies
//!
//! Depending on the model and pipeline, the inference backend answers with
//! either a flat vector (`[0.1, 0.2, ...]`) or one vector per input row
//! (`[[0.1, 0.2, ...], ...]`). Callers only ever see a single flat embedding:
//! for the two-dimensional shape the first row is taken.

use serde::Deserialize;

use crate::errors::QaError;
use crate::models::Embedding;
use crate::Result;

/// Response shapes accepted from the embedding backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingPayload {
    Flat(Vec<f32>),
    Nested(Vec<Vec<f32>>),
}

impl EmbeddingPayload {
    /// Collapse the payload into exactly one flat embedding
    pub fn into_embedding(self) -> Result<Embedding> {
        let embedding = match self {
            Self::Flat(values) => values,
            Self::Nested(rows) => rows.into_iter().next().ok_or_else(|| {
                QaError::UnexpectedResponse("embedding response has no rows".to_string())
            })?,
        };

        if embedding.is_empty() {
            return Err(QaError::UnexpectedResponse(
                "embedding response is empty".to_string(),
            ));
        }
        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(QaError::UnexpectedResponse(
                "embedding contains non-finite values".to_string(),
            ));
        }
        Ok(embedding)
    }
}

/// Parse a raw response body into a flat embedding
pub fn parse_embedding_body(body: &str) -> Result<Embedding> {
    let payload: EmbeddingPayload = serde_json::from_str(body).map_err(|e| {
        QaError::UnexpectedResponse(format!("unrecognised embedding payload: {e}"))
    })?;
    payload.into_embedding()
}
