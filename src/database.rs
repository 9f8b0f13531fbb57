//! Context store accessor backed by PostgreSQL + pgvector
//!
//! The pool is created lazily on the first query and cached for the lifetime
//! of the [`ContextStore`]; every later call reuses it. The store owns the
//! pool exclusively, so releasing it is a matter of calling [`ContextStore::close`]
//! at shutdown.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use sqlx::Row;
use tokio::sync::OnceCell;
use tracing::debug;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::ContextRecord;
use crate::QaError;
use crate::Result;

/// Source of candidate contexts for ranking
#[async_trait]
pub trait ContextSource: Send + Sync {
    /// Fetch every stored record; an empty store yields an empty list
    ///
    /// # Errors
    /// - `StoreUnavailable` when no connection string is configured or the
    ///   connection cannot be established
    async fn fetch_all(&self) -> Result<Vec<ContextRecord>>;
}

/// Destination for newly ingested records
#[async_trait]
pub trait ContextWriter: Send + Sync {
    /// Persist one record, returning its id
    async fn insert(&self, record: &ContextRecord) -> Result<Uuid>;

    /// Atomically swap the stored records for `records`, returning how many were written
    async fn replace_all(&self, records: &[ContextRecord]) -> Result<usize>;
}

#[derive(Debug, Clone)]
struct PoolSettings {
    max_connections: u32,
    min_connections: u32,
    acquire_timeout: std::time::Duration,
}

/// Lazily-connected handle to the `contexts` table
#[derive(Debug)]
pub struct ContextStore {
    url: Option<String>,
    settings: PoolSettings,
    pool: OnceCell<PgPool>,
}

impl ContextStore {
    /// Create a store from configuration; no connection is made yet
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            url: config.database.url.clone(),
            settings: PoolSettings {
                max_connections: config.database.max_connections,
                min_connections: config.database.min_connections,
                acquire_timeout: config.connection_timeout(),
            },
            pool: OnceCell::new(),
        }
    }

    /// Wrap an already-established pool
    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            url: None,
            settings: PoolSettings {
                max_connections: 0,
                min_connections: 0,
                acquire_timeout: std::time::Duration::ZERO,
            },
            pool: OnceCell::new_with(Some(pool)),
        }
    }

    /// Whether the pool has been established
    pub fn is_connected(&self) -> bool {
        self.pool.initialized()
    }

    /// Get the cached pool, connecting on first use
    pub async fn pool(&self) -> Result<&PgPool> {
        self.pool.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> Result<PgPool> {
        let url = self.url.as_deref().ok_or_else(|| {
            QaError::StoreUnavailable("database.url is not configured".to_string())
        })?;

        info!("Connecting to context store");
        PgPoolOptions::new()
            .max_connections(self.settings.max_connections)
            .min_connections(self.settings.min_connections)
            .acquire_timeout(self.settings.acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| QaError::StoreUnavailable(format!("failed to connect: {e}")))
    }

    /// Initialize database schema
    pub async fn init_schema(&self) -> Result<()> {
        let pool = self.pool().await?;

        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(pool)
            .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS contexts (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                question TEXT,
                answer TEXT,
                context TEXT NOT NULL,
                embedding VECTOR NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            ",
        )
        .execute(pool)
        .await?;

        info!("Context store schema initialized");
        Ok(())
    }

    /// Count stored records
    pub async fn count(&self) -> Result<i64> {
        let pool = self.pool().await?;
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contexts")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Close the pool if it was ever opened
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            info!("Closing context store pool");
            pool.close().await;
        }
    }
}

#[async_trait]
impl ContextSource for ContextStore {
    async fn fetch_all(&self) -> Result<Vec<ContextRecord>> {
        let pool = self.pool().await?;

        let rows = sqlx::query(
            r"
            SELECT id, question, answer, context, embedding, created_at
            FROM contexts
            ORDER BY created_at, id
            ",
        )
        .fetch_all(pool)
        .await?;

        let records = rows
            .into_iter()
            .map(|row| {
                let embedding: pgvector::Vector = row.try_get("embedding")?;
                Ok(ContextRecord {
                    id: row.try_get("id")?,
                    text: row.try_get("context")?,
                    embedding: embedding.to_vec(),
                    question: row.try_get("question")?,
                    answer: row.try_get("answer")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;

        debug!("Fetched {} context records", records.len());
        Ok(records)
    }
}

#[async_trait]
impl ContextWriter for ContextStore {
    async fn insert(&self, record: &ContextRecord) -> Result<Uuid> {
        let pool = self.pool().await?;
        let id: Uuid = sqlx::query_scalar(
            r"
            INSERT INTO contexts (question, answer, context, embedding)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&record.question)
        .bind(&record.answer)
        .bind(&record.text)
        .bind(pgvector::Vector::from(record.embedding.clone()))
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    async fn replace_all(&self, records: &[ContextRecord]) -> Result<usize> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;

        let removed = sqlx::query("DELETE FROM contexts")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for record in records {
            sqlx::query(
                r"
                INSERT INTO contexts (question, answer, context, embedding)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(&record.question)
            .bind(&record.answer)
            .bind(&record.text)
            .bind(pgvector::Vector::from(record.embedding.clone()))
            .execute(&mut *tx)
            .await?;
        }

        // Dropping an uncommitted transaction rolls it back
        tx.commit().await?;
        info!(
            "Replaced {} stored contexts with {}",
            removed,
            records.len()
        );
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_url_is_store_unavailable() {
        let store = ContextStore::from_config(&AppConfig::default());
        let err = store.fetch_all().await.unwrap_err();
        assert!(matches!(err, QaError::StoreUnavailable(_)));
        assert!(!store.is_connected());
    }

    #[tokio::test]
    async fn test_unreachable_database_is_store_unavailable() {
        let mut config = AppConfig::default();
        config.database.url = Some("postgres://qa:qa@127.0.0.1:9/university".to_string());
        config.database.connection_timeout = 1;

        let store = ContextStore::from_config(&config);
        let err = store.fetch_all().await.unwrap_err();
        assert!(matches!(err, QaError::StoreUnavailable(_)));
        assert!(!store.is_connected());
    }

    #[tokio::test]
    async fn test_with_pool_reuses_given_pool() {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy("postgres://qa:qa@127.0.0.1:9/university")
            .unwrap();

        let store = ContextStore::with_pool(pool);
        assert!(store.is_connected());
        // No url is configured, so success means the wrapped pool was returned
        assert!(store.pool().await.is_ok());
    }

    #[tokio::test]
    async fn test_close_without_connection_is_noop() {
        let store = ContextStore::from_config(&AppConfig::default());
        store.close().await;
        assert!(!store.is_connected());
    }
}
