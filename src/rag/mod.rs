//! Retrieval-augmented question answering
//!
//! This module composes the answering pipeline:
//! - Cosine-similarity ranking of stored contexts against the question
//! - A confidence threshold gating whether any context is used
//! - Grounded generation with the retrieved context
//! - Cleaning and quality-gating of the generated answer
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use uniqa::config::AppConfig;
//! use uniqa::database::ContextStore;
//! use uniqa::rag::QaService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let store = Arc::new(ContextStore::from_config(&config));
//!     let service = QaService::from_config(&config, store.clone())?;
//!
//!     let outcome = service.ask("What hostels are available for girls?").await;
//!     println!("[{}] {}", outcome.status_code(), outcome.message());
//!
//!     store.close().await;
//!     Ok(())
//! }
//! ```

pub mod pipeline;
pub mod postprocess;
pub mod ranker;

pub use pipeline::AnswerSource;
pub use pipeline::PipelineSettings;
pub use pipeline::QaOutcome;
pub use pipeline::QaService;
pub use postprocess::AnswerPostprocessor;
pub use ranker::cosine_similarity;
pub use ranker::SimilarityRanker;
