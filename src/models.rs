use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Fixed-length vector representation of a piece of text
pub type Embedding = Vec<f32>;

/// A stored passage plus its precomputed embedding, the unit of retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
    pub id: Option<Uuid>,
    pub text: String,
    pub embedding: Embedding,
    /// Provenance: the question this passage was ingested for
    pub question: Option<String>,
    /// Provenance: the reference answer, when the dataset had one
    pub answer: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ContextRecord {
    /// Record without provenance metadata
    pub fn new(text: impl Into<String>, embedding: Embedding) -> Self {
        Self {
            id: None,
            text: text.into(),
            embedding,
            question: None,
            answer: None,
            created_at: None,
        }
    }

    #[must_use]
    pub fn with_provenance(mut self, question: Option<String>, answer: Option<String>) -> Self {
        self.question = question;
        self.answer = answer;
        self
    }
}

/// Outcome of ranking: the accepted context (if any) and the best score seen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub context: Option<String>,
    pub score: f32,
}

impl RetrievalResult {
    pub const fn empty() -> Self {
        Self {
            context: None,
            score: 0.0,
        }
    }

    pub const fn is_found(&self) -> bool {
        self.context.is_some()
    }
}

/// One entry of an ingestion dataset file
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetEntry {
    pub question: String,
    pub context: String,
    #[serde(default)]
    pub answer: Option<String>,
}

/// Counts reported after an ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub total: usize,
    pub inserted: usize,
    pub skipped: usize,
}
