//! Text generation module
//!
//! Sends a grounded prompt to a hosted text-generation model, retrying while
//! the model reports that it is still loading.

pub mod client;
pub mod clock;
pub mod prompts;
pub mod types;

use async_trait::async_trait;
pub use client::GenerationClient;
pub use client::RetryPolicy;
pub use clock::RecordingSleeper;
pub use clock::Sleeper;
pub use clock::TokioSleeper;
pub use prompts::build_prompt;
pub use types::GenerationParams;

use crate::Result;

/// Anything that can complete a prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate raw text for `prompt`
    ///
    /// # Errors
    /// - `ModelWarmingTimeout` when every attempt reported a loading model
    /// - `BackendUnavailable` for any other backend-reported or network error
    /// - `UnexpectedResponse` when the body lacks `generated_text`
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;
}
