use thiserror::Error;

#[derive(Error, Debug)]
pub enum QaError {
    /// User-correctable request problem (empty question, blank text)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Inference backend could not be reached or answered with a non-2xx status
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Context store connection missing or could not be established
    #[error("Context store unavailable: {0}")]
    StoreUnavailable(String),

    /// Generation model kept reporting that it is loading
    #[error("Model still warming up after {attempts} attempts")]
    ModelWarmingTimeout { attempts: u32 },

    /// Backend answered, but not in a shape we understand
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl QaError {
    /// HTTP-equivalent status for this error when it escapes the pipeline
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            _ => 500,
        }
    }

    /// Whether a caller may reasonably retry the same request later
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable(_) | Self::StoreUnavailable(_) | Self::ModelWarmingTimeout { .. }
        )
    }
}

impl From<config::ConfigError> for QaError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<reqwest::Error> for QaError {
    fn from(err: reqwest::Error) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, QaError>;
