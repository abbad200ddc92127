// file: src/app.rs
// description: question answering application shared by the cli and the web server
// reference: lazily initialized stores with a bounded answer history

use crate::config::{Config, LlmProvider};
use crate::error::Result;
use crate::llm::LlmServices;
use crate::loader::DocumentSource;
use crate::models::RetrievedChunk;
use crate::retrieval::HierarchicalRetriever;
use crate::store::VectorStoreManager;
use crate::utils::{HealthCheck, HealthReport, Validator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;
use tokio::sync::{OnceCell, RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub query: String,
    pub results: Vec<RetrievedChunk>,
    pub timestamp: DateTime<Utc>,
}

pub struct QaApplication {
    config: Config,
    source: DocumentSource,
    manager: VectorStoreManager,
    retriever: OnceCell<HierarchicalRetriever>,
    history: RwLock<VecDeque<HistoryEntry>>,
}

impl QaApplication {
    pub async fn new(config: Config) -> Result<Self> {
        let services = LlmServices::from_config(&config)?;
        let manager = VectorStoreManager::new(config.clone(), services).await?;
        Ok(Self::with_manager(config, manager))
    }

    pub fn with_manager(config: Config, manager: VectorStoreManager) -> Self {
        let source = DocumentSource::File(config.document.path.clone());
        Self {
            config,
            source,
            manager,
            retriever: OnceCell::new(),
            history: RwLock::new(VecDeque::new()),
        }
    }

    /// Replaces the configured document, e.g. with inline text.
    pub fn with_source(mut self, source: DocumentSource) -> Self {
        self.source = source;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn manager(&self) -> &VectorStoreManager {
        &self.manager
    }

    pub fn is_initialized(&self) -> bool {
        self.retriever.initialized()
    }

    /// Loads or builds the stores on first use; later calls reuse them.
    pub async fn initialize_stores(&self) -> Result<&HierarchicalRetriever> {
        self.retriever
            .get_or_try_init(|| async {
                let stores = self
                    .manager
                    .get_or_create_vector_stores(&self.source, false)
                    .await?;
                Ok(HierarchicalRetriever::from_stores(&stores))
            })
            .await
    }

    pub async fn get_answer(
        &self,
        query: &str,
        k_summaries: Option<usize>,
        k_chunks: Option<usize>,
    ) -> Result<HistoryEntry> {
        let query = Validator::validate_query(query)?;
        let k_summaries = Validator::validate_k(
            "k_summaries",
            k_summaries.unwrap_or(self.config.retrieval.k_summaries),
        )?;
        let k_chunks = Validator::validate_k(
            "k_chunks",
            k_chunks.unwrap_or(self.config.retrieval.k_chunks),
        )?;

        let retriever = self.initialize_stores().await?;
        let results = retriever.retrieve(query, k_summaries, k_chunks).await?;
        info!("Query returned {} chunks", results.len());

        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            query: query.to_string(),
            results,
            timestamp: Utc::now(),
        };
        self.record(entry.clone()).await;

        Ok(entry)
    }

    async fn record(&self, entry: HistoryEntry) {
        let limit = self.config.server.history_limit;
        if limit == 0 {
            return;
        }

        let mut history = self.history.write().await;
        history.push_back(entry);
        while history.len() > limit {
            history.pop_front();
        }
    }

    /// Oldest first.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.history.read().await.iter().cloned().collect()
    }

    pub async fn health(&self) -> HealthReport {
        HealthReport::new(vec![self.check_vector_store().await, self.check_llm()])
    }

    async fn check_vector_store(&self) -> HealthCheck {
        let start = Instant::now();

        match self.manager.client().ping().await {
            Err(e) => HealthCheck::unhealthy("vector_store", e.to_string(), start.elapsed()),
            Ok(_) => match self.manager.stores_exist().await {
                Ok(true) => HealthCheck::healthy("vector_store", start.elapsed()),
                Ok(false) => HealthCheck::degraded(
                    "vector_store",
                    "stores not built yet; they are created on the first query".to_string(),
                    start.elapsed(),
                ),
                Err(e) => HealthCheck::unhealthy("vector_store", e.to_string(), start.elapsed()),
            },
        }
    }

    fn check_llm(&self) -> HealthCheck {
        let start = Instant::now();
        match self.config.llm.provider {
            LlmProvider::OpenAi => match self.config.require_api_key() {
                Ok(_) => HealthCheck::healthy_with(
                    "llm",
                    format!(
                        "{} / {}",
                        self.config.llm.chat_model, self.config.llm.embedding_model
                    ),
                    start.elapsed(),
                ),
                Err(e) => HealthCheck::unhealthy("llm", e.to_string(), start.elapsed()),
            },
            LlmProvider::Offline => HealthCheck::degraded(
                "llm",
                "offline provider: hashing embeddings and extractive summaries".to_string(),
                start.elapsed(),
            ),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    pub const BOOK: &str = "Quicksort picks a pivot and partitions the array around it.\u{000C}\
        Dijkstra's algorithm computes shortest paths in weighted graphs.\u{000C}\
        A binary heap supports insert and extract-min in logarithmic time.";

    pub async fn offline_app(temp: &TempDir, history_limit: usize) -> QaApplication {
        let mut config = Config::offline();
        config.storage.uri = temp.path().join("stores").display().to_string();
        config.llm.embedding_dim = 128;
        config.document.chunk_size = 80;
        config.document.chunk_overlap = 10;
        config.server.history_limit = history_limit;

        QaApplication::new(config)
            .await
            .unwrap()
            .with_source(DocumentSource::Text(BOOK.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::offline_app;
    use super::*;
    use crate::error::QaError;
    use crate::utils::HealthStatus;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_answer_initializes_once_and_records_history() {
        let temp = TempDir::new().unwrap();
        let app = offline_app(&temp, 10).await;
        assert!(!app.is_initialized());

        let answer = app
            .get_answer("How does quicksort partition?", None, Some(2))
            .await
            .unwrap();
        assert!(app.is_initialized());
        assert!(!answer.results.is_empty());
        assert!(answer.results.len() <= 3 * 2);

        app.get_answer("shortest paths", Some(1), Some(1)).await.unwrap();

        let history = app.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].query, "How does quicksort partition?");
        assert_eq!(history[1].results.len(), 1);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let temp = TempDir::new().unwrap();
        let app = offline_app(&temp, 2).await;

        for query in ["heap", "graph", "pivot"] {
            app.get_answer(query, None, None).await.unwrap();
        }

        let queries: Vec<String> = app.history().await.into_iter().map(|h| h.query).collect();
        assert_eq!(queries, vec!["graph", "pivot"]);
    }

    #[tokio::test]
    async fn test_invalid_queries_rejected_before_indexing() {
        let temp = TempDir::new().unwrap();
        let app = offline_app(&temp, 10).await;

        let err = app.get_answer("   ", None, None).await.unwrap_err();
        assert!(err.is_validation());
        let err = app.get_answer("heap", Some(0), None).await.unwrap_err();
        assert!(matches!(err, QaError::Validation(_)));

        assert!(!app.is_initialized());
        assert!(app.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_health_reports_offline_and_unbuilt_stores() {
        let temp = TempDir::new().unwrap();
        let app = offline_app(&temp, 10).await;

        let report = app.health().await;
        assert_eq!(report.overall_status, HealthStatus::Degraded);
        assert_eq!(report.checks.len(), 2);

        app.initialize_stores().await.unwrap();
        let report = app.health().await;
        let store_check = report
            .checks
            .iter()
            .find(|c| c.component == "vector_store")
            .unwrap();
        assert_eq!(store_check.status, HealthStatus::Healthy);
    }
}
