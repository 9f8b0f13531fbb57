//! One-shot question handler

use std::sync::Arc;

use crate::cli::output::print_info;
use crate::cli::output::print_outcome;
use crate::cli::output::truncate_str;
use crate::database::ContextStore;
use crate::rag::QaOutcome;
use crate::rag::QaService;
use crate::AppConfig;
use crate::QaError;
use crate::Result;

/// Handle ask command: run the pipeline once and print the answer
pub async fn handle_ask_command(config: &AppConfig, question: &str) -> Result<()> {
    print_info(&format!("🤔 {}", truncate_str(question, 120)));

    let store = Arc::new(ContextStore::from_config(config));
    let service = QaService::from_config(config, store.clone())?;
    let outcome = service.ask(question).await;
    store.close().await;

    print_outcome(&outcome);
    match outcome {
        QaOutcome::Answered { .. } => Ok(()),
        QaOutcome::Rejected { error } => Err(QaError::InvalidInput(error)),
        QaOutcome::Failed { error } => Err(QaError::BackendUnavailable(error)),
    }
}
