//! Dataset ingestion handler

use std::path::Path;

use crate::cli::output::print_info;
use crate::cli::output::print_ingest_report;
use crate::database::ContextStore;
use crate::embeddings::EmbeddingClient;
use crate::ingest::ingest_entries;
use crate::ingest::load_dataset;
use crate::AppConfig;
use crate::Result;

/// Handle dataset ingestion command
pub async fn handle_ingest_command(
    config: &AppConfig,
    path: &Path,
    concurrency: usize,
) -> Result<()> {
    let entries = load_dataset(path)?;
    print_info(&format!(
        "Loaded {} entries from {}",
        entries.len(),
        path.display()
    ));

    let embedder = EmbeddingClient::from_config(config)?;
    let store = ContextStore::from_config(config);
    let result = ingest_entries(&embedder, &store, entries, concurrency).await;
    store.close().await;

    print_ingest_report(&result?);
    Ok(())
}
