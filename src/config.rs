use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::QaError;

/// Environment variable prefix for layered overrides, e.g. `UNIQA__RETRIEVAL__THRESHOLD=0.3`
pub const ENV_PREFIX: &str = "UNIQA";

/// Well-known variables honoured on top of the prefixed ones
pub const ENV_API_TOKEN: &str = "HF_API_TOKEN";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string; absent means the store is unavailable
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub min_connections: u32,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_connection_timeout() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            min_connections: 0,
            connection_timeout: default_connection_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_directory")]
    pub directory: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

fn default_embedding_endpoint() -> String {
    "https://api-inference.huggingface.co/pipeline/feature-extraction/sentence-transformers/all-MiniLM-L6-v2"
        .to_string()
}

fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default)]
    pub stop: Vec<String>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
}

fn default_generation_endpoint() -> String {
    "https://api-inference.huggingface.co/models/google/flan-t5-base".to_string()
}

fn default_max_new_tokens() -> u32 {
    150
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_secs() -> u64 {
    5
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_generation_endpoint(),
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            stop: Vec::new(),
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Minimum cosine similarity for a context to be used (inclusive)
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Cleaned generations shorter than this fall back to the context
    #[serde(default = "default_min_answer_chars")]
    pub min_answer_chars: usize,
}

fn default_threshold() -> f32 {
    0.5
}

fn default_min_answer_chars() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            min_answer_chars: default_min_answer_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: false,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Bearer token for the inference backends
    #[serde(default)]
    pub api_token: Option<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file, layered with environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(QaError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Config file not found: {}", path.display()),
            )));
        }
        Self::from_sources(Some(path))
    }

    /// Load configuration from the default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            tracing::warn!("No config file found, using defaults and environment");
            Self::from_sources(None)
        }
    }

    fn from_sources(file: Option<&Path>) -> crate::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Self = settings.try_deserialize()?;
        config.apply_well_known_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_well_known_env(&mut self) {
        if let Ok(token) = std::env::var(ENV_API_TOKEN) {
            if !token.trim().is_empty() {
                self.api_token = Some(token);
            }
        }
        if let Ok(url) = std::env::var(ENV_DATABASE_URL) {
            if !url.trim().is_empty() {
                self.database.url = Some(url);
            }
        }
    }

    /// Reject values the pipeline cannot operate with
    pub fn validate(&self) -> crate::Result<()> {
        let generation = &self.generation;
        if !(generation.temperature > 0.0 && generation.temperature <= 1.0) {
            return Err(QaError::Config(format!(
                "generation.temperature must be in (0, 1], got {}",
                generation.temperature
            )));
        }
        if !(generation.top_p > 0.0 && generation.top_p <= 1.0) {
            return Err(QaError::Config(format!(
                "generation.top_p must be in (0, 1], got {}",
                generation.top_p
            )));
        }
        if generation.max_attempts == 0 {
            return Err(QaError::Config(
                "generation.max_attempts must be at least 1".to_string(),
            ));
        }
        if generation.max_new_tokens == 0 {
            return Err(QaError::Config(
                "generation.max_new_tokens must be at least 1".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.retrieval.threshold) {
            return Err(QaError::Config(format!(
                "retrieval.threshold must be in [-1, 1], got {}",
                self.retrieval.threshold
            )));
        }
        for (name, endpoint) in [
            ("embeddings.endpoint", &self.embeddings.endpoint),
            ("generation.endpoint", &self.generation.endpoint),
        ] {
            url::Url::parse(endpoint)
                .map_err(|e| QaError::Config(format!("{name} is not a valid URL: {e}")))?;
        }
        Ok(())
    }

    /// Get database URL, if configured
    pub fn database_url(&self) -> Option<&str> {
        self.database.url.as_deref()
    }

    /// Get connection timeout
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.database.connection_timeout)
    }

    /// Get inference API token, if configured
    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    /// Get the pause between generation attempts while the model loads
    pub fn backoff_interval(&self) -> Duration {
        Duration::from_secs(self.generation.backoff_secs)
    }

    /// Get the per-request timeout enforced by the HTTP layer
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Database URL with the password replaced, for display
    pub fn masked_database_url(&self) -> String {
        self.database_url().map_or_else(|| "(not set)".to_string(), mask_database_url)
    }
}

/// Replace the password component of a connection string with `***`
pub fn mask_database_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) if parsed.password().is_some() => {
            // set_password only fails for cannot-be-a-base URLs, which have no password
            let _ = parsed.set_password(Some("***"));
            parsed.to_string()
        }
        _ => raw.to_string(),
    }
}
