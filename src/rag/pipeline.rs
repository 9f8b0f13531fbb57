//! Complete question-answering pipeline: Embed -> Retrieve -> Generate -> Clean
//!
//! ```text
//! ReceivedQuestion -> EmbeddingQuestion -> Retrieving -> ContextFound    -> Generating -> Cleaning -> Answered
//!                                                     \-> ContextNotFound -> Answered (canned)
//! any component error -> Failed (degraded answer)
//! ```
//!
//! Nothing escapes [`QaService::ask`] as an error: every outcome is a
//! [`QaOutcome`] carrying an HTTP-equivalent status.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::info_span;
use tracing::warn;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::database::ContextSource;
use crate::embeddings::Embedder;
use crate::embeddings::EmbeddingClient;
use crate::errors::QaError;
use crate::llm::build_prompt;
use crate::llm::GenerationClient;
use crate::llm::GenerationParams;
use crate::llm::TextGenerator;
use crate::rag::postprocess::fallback_answer;
use crate::rag::postprocess::AnswerPostprocessor;
use crate::rag::ranker::SimilarityRanker;
use crate::Result;

pub const NO_CONTEXT_ANSWER: &str =
    "Sorry, I couldn't find relevant information to answer your question.";
pub const WARMING_UP_ANSWER: &str =
    "The answering model is taking longer than expected to start. Please try again in a minute.";
pub const SOFT_FAILURE_ANSWER: &str =
    "Sorry, I couldn't process that question right now. Please try rephrasing it or ask again later.";
pub const DEGRADED_ANSWER: &str =
    "Sorry, something went wrong while answering your question. Please try again later.";

/// Longest question accepted, in characters
pub const MAX_QUESTION_CHARS: usize = 1000;

/// Pipeline states, logged as the request moves through them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    ReceivedQuestion,
    EmbeddingQuestion,
    Retrieving,
    ContextFound,
    ContextNotFound,
    Generating,
    Cleaning,
    Answered,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Where the final answer text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    /// Cleaned model output
    Generated,
    /// Derived from the retrieved context after generation was unusable
    ContextFallback,
    /// No context cleared the threshold
    NoContext,
    /// The generation model never finished loading
    WarmingUp,
    /// A component answered in a shape we could not use
    SoftFailure,
}

/// Result of one question, ready for the transport layer
#[derive(Debug, Clone, PartialEq)]
pub enum QaOutcome {
    Answered {
        answer: String,
        source: AnswerSource,
        score: Option<f32>,
    },
    /// The question itself was unusable (400)
    Rejected { error: String },
    /// An infrastructure failure (500)
    Failed { error: String },
}

impl QaOutcome {
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Answered { .. } => 200,
            Self::Rejected { .. } => 400,
            Self::Failed { .. } => 500,
        }
    }

    /// The text shown to the user, whatever the outcome
    pub fn message(&self) -> &str {
        match self {
            Self::Answered { answer, .. } => answer,
            Self::Rejected { error } | Self::Failed { error } => error,
        }
    }

    fn answered(answer: impl Into<String>, source: AnswerSource, score: Option<f32>) -> Self {
        Self::Answered {
            answer: answer.into(),
            source,
            score,
        }
    }
}

/// Tunables for the orchestrator
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub threshold: f32,
    pub min_answer_chars: usize,
    pub params: GenerationParams,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            threshold: config.retrieval.threshold,
            min_answer_chars: config.retrieval.min_answer_chars,
            params: GenerationParams::from_config(&config.generation),
        }
    }
}

/// Retrieval-answer orchestrator
pub struct QaService {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn ContextSource>,
    generator: Arc<dyn TextGenerator>,
    ranker: SimilarityRanker,
    postprocessor: AnswerPostprocessor,
    params: GenerationParams,
}

impl QaService {
    /// Create from existing components
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn ContextSource>,
        generator: Arc<dyn TextGenerator>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            embedder,
            store,
            generator,
            ranker: SimilarityRanker::new(settings.threshold),
            postprocessor: AnswerPostprocessor::new(settings.min_answer_chars),
            params: settings.params,
        }
    }

    /// Build the HTTP-backed clients from configuration around a shared store
    pub fn from_config(config: &AppConfig, store: Arc<dyn ContextSource>) -> Result<Self> {
        let embedder = Arc::new(EmbeddingClient::from_config(config)?);
        let generator = Arc::new(GenerationClient::from_config(config)?);
        Ok(Self::new(
            embedder,
            store,
            generator,
            PipelineSettings::from_config(config),
        ))
    }

    pub const fn ranker(&self) -> &SimilarityRanker {
        &self.ranker
    }

    /// Answer one question. Never fails: errors become degraded outcomes.
    pub async fn ask(&self, question: &str) -> QaOutcome {
        let request_id = Uuid::new_v4();
        let span = info_span!("ask", %request_id);

        async move {
            info!("Processing question: {}", question);
            let outcome = match self.run(question).await {
                Ok(outcome) => outcome,
                Err(err) => Self::outcome_for_error(&err),
            };
            let state = match outcome {
                QaOutcome::Answered { .. } => PipelineState::Answered,
                QaOutcome::Rejected { .. } | QaOutcome::Failed { .. } => PipelineState::Failed,
            };
            info!(
                "Question finished in state {} with status {}",
                state,
                outcome.status_code()
            );
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(&self, question: &str) -> Result<QaOutcome> {
        transition(PipelineState::ReceivedQuestion);
        let question = match validate_question(question) {
            Ok(question) => question,
            Err(QaError::InvalidInput(reason)) => {
                warn!("Rejected question: {}", reason);
                return Ok(QaOutcome::Rejected { error: reason });
            }
            Err(err) => return Err(err),
        };

        transition(PipelineState::EmbeddingQuestion);
        let query = self.embedder.embed(question).await?;

        transition(PipelineState::Retrieving);
        let candidates = self.store.fetch_all().await?;
        let retrieval = self.ranker.rank(&query, &candidates)?;

        let Some(context) = retrieval.context else {
            transition(PipelineState::ContextNotFound);
            info!(
                "No context above threshold {:.2} (best {:.4} of {})",
                self.ranker.threshold(),
                retrieval.score,
                candidates.len()
            );
            return Ok(QaOutcome::answered(
                NO_CONTEXT_ANSWER,
                AnswerSource::NoContext,
                Some(retrieval.score),
            ));
        };
        transition(PipelineState::ContextFound);
        let score = Some(retrieval.score);

        transition(PipelineState::Generating);
        let prompt = build_prompt(question, &context);
        let raw = match self.generator.generate(&prompt, &self.params).await {
            Ok(raw) => raw,
            Err(QaError::ModelWarmingTimeout { attempts }) => {
                warn!("Generation model still loading after {} attempts", attempts);
                return Ok(QaOutcome::answered(
                    WARMING_UP_ANSWER,
                    AnswerSource::WarmingUp,
                    score,
                ));
            }
            Err(QaError::UnexpectedResponse(reason)) => {
                warn!("Unusable generation response, answering from context: {}", reason);
                return Ok(QaOutcome::answered(
                    fallback_answer(&context),
                    AnswerSource::ContextFallback,
                    score,
                ));
            }
            Err(err) => return Err(err),
        };

        transition(PipelineState::Cleaning);
        let (answer, fell_back) = self.postprocessor.finalize(&raw, &context);
        let source = if fell_back {
            debug!("Generated text failed the quality gate: {:?}", raw);
            AnswerSource::ContextFallback
        } else {
            AnswerSource::Generated
        };

        Ok(QaOutcome::answered(answer, source, score))
    }

    fn outcome_for_error(err: &QaError) -> QaOutcome {
        match err {
            QaError::ModelWarmingTimeout { .. } => {
                QaOutcome::answered(WARMING_UP_ANSWER, AnswerSource::WarmingUp, None)
            }
            QaError::UnexpectedResponse(reason) => {
                warn!("Unexpected backend response: {}", reason);
                QaOutcome::answered(SOFT_FAILURE_ANSWER, AnswerSource::SoftFailure, None)
            }
            other => {
                error!("Pipeline failed: {}", other);
                QaOutcome::Failed {
                    error: DEGRADED_ANSWER.to_string(),
                }
            }
        }
    }
}

fn transition(state: PipelineState) {
    debug!("-> {}", state);
}

/// Trim the question and reject empty or oversized input
pub fn validate_question(question: &str) -> Result<&str> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(QaError::InvalidInput(
            "Question must be a non-empty string".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_QUESTION_CHARS {
        return Err(QaError::InvalidInput(format!(
            "Question must be at most {MAX_QUESTION_CHARS} characters"
        )));
    }
    Ok(trimmed)
}
