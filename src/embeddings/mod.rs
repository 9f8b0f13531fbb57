//! Embeddings generation module
//!
//! Turns question text into a single flat vector via a hosted
//! feature-extraction backend.
//!
//! # Examples
//!
//! ```rust,no_run
//! use uniqa::config::AppConfig;
//! use uniqa::embeddings::Embedder;
//! use uniqa::embeddings::EmbeddingClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let client = EmbeddingClient::from_config(&config)?;
//!
//!     let embedding = client.embed("What hostels are available for girls?").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod payload;
pub mod text_preprocessing;

use async_trait::async_trait;
pub use client::EmbeddingClient;
pub use payload::EmbeddingPayload;
pub use text_preprocessing::preprocess_text_for_embedding;

use crate::models::Embedding;
use crate::Result;

/// Anything that can turn text into an embedding
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a non-empty text
    ///
    /// # Errors
    /// - `InvalidInput` for empty or whitespace-only text
    /// - `BackendUnavailable` on network failure or non-2xx status
    /// - `UnexpectedResponse` when the payload is not a flat or nested vector
    async fn embed(&self, text: &str) -> Result<Embedding>;
}
