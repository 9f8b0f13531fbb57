//! Offline loading of question/context pairs into the context store
//!
//! Each entry's `question` is embedded (that is what incoming questions are
//! compared against) and stored alongside its `context`. Entries whose
//! embedding fails are skipped and logged; the run carries on. A run
//! replaces the whole store in one transaction, so loading the same dataset
//! twice leaves one copy of each context.

use std::path::Path;

use futures::stream::StreamExt;
use futures::stream::{
    self,
};
use tracing::info;
use tracing::warn;

use crate::database::ContextWriter;
use crate::embeddings::Embedder;
use crate::models::ContextRecord;
use crate::models::DatasetEntry;
use crate::models::IngestReport;
use crate::Result;

/// Default number of embedding requests in flight during ingestion
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Read a JSON array of `{question, context, answer?}` entries
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Vec<DatasetEntry>> {
    let content = std::fs::read_to_string(path)?;
    let entries: Vec<DatasetEntry> = serde_json::from_str(&content)?;
    Ok(entries)
}

/// Embed every entry and replace the stored contexts with the result
pub async fn ingest_entries(
    embedder: &dyn Embedder,
    writer: &dyn ContextWriter,
    entries: Vec<DatasetEntry>,
    concurrency: usize,
) -> Result<IngestReport> {
    let total = entries.len();
    info!("Embedding {} entries with concurrency {}", total, concurrency.max(1));

    let embedded: Vec<Option<ContextRecord>> = stream::iter(entries)
        .map(|entry| async move {
            match embedder.embed(&entry.question).await {
                Ok(embedding) => Some(
                    ContextRecord::new(entry.context, embedding)
                        .with_provenance(Some(entry.question), entry.answer),
                ),
                Err(e) => {
                    warn!("Failed to embed question {:?}: {}", entry.question, e);
                    None
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let records: Vec<ContextRecord> = embedded.into_iter().flatten().collect();
    let inserted = writer.replace_all(&records).await?;
    let report = IngestReport {
        total,
        inserted,
        skipped: total - records.len(),
    };

    info!(
        "Ingestion finished: {} inserted, {} skipped of {}",
        report.inserted, report.skipped, report.total
    );
    Ok(report)
}
