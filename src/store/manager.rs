// file: src/store/manager.rs
// description: builds, reuses and resets the summary and detailed vector stores
// reference: https://docs.rs/lancedb

use crate::config::Config;
use crate::error::Result;
use crate::llm::{BackoffPolicy, LlmServices};
use crate::loader::DocumentSource;
use crate::processing::{DocumentProcessor, ExtractiveSummarizer, MapReduceSummarizer, Summarizer};
use crate::store::client::LanceDbClient;
use crate::store::manifest::{IndexManifest, IndexSettings};
use crate::store::vector_store::VectorStore;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct VectorStores {
    pub summary: VectorStore,
    pub detailed: VectorStore,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub uri: String,
    pub summary_table: String,
    pub detailed_table: String,
    pub summary_count: usize,
    pub detailed_count: usize,
    pub manifest: Option<IndexManifest>,
}

pub struct VectorStoreManager {
    config: Config,
    client: LanceDbClient,
    services: LlmServices,
    summarizer: Arc<dyn Summarizer>,
    summarizer_name: String,
    show_progress: bool,
}

impl VectorStoreManager {
    pub async fn new(config: Config, services: LlmServices) -> Result<Self> {
        let client = LanceDbClient::new(&config.storage.uri).await?;

        let (summarizer, summarizer_name): (Arc<dyn Summarizer>, String) = match &services.chat {
            Some(chat) => (
                Arc::new(MapReduceSummarizer::new(
                    Arc::clone(chat),
                    config.summarization.token_max,
                    BackoffPolicy::from_config(&config.summarization),
                )),
                format!("map-reduce:{}", chat.model_name()),
            ),
            None => (
                Arc::new(ExtractiveSummarizer::default()),
                "extractive".to_string(),
            ),
        };

        Ok(Self {
            config,
            client,
            services,
            summarizer,
            summarizer_name,
            show_progress: false,
        })
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>, name: &str) -> Self {
        self.summarizer = summarizer;
        self.summarizer_name = name.to_string();
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn client(&self) -> &LanceDbClient {
        &self.client
    }

    fn manifest_path(&self) -> PathBuf {
        IndexManifest::path_for(&self.config.storage.uri)
    }

    async fn settings_for(&self, source: &DocumentSource) -> Result<IndexSettings> {
        Ok(IndexSettings {
            source: source.name(),
            fingerprint: source.fingerprint().await?,
            chunk_size: self.config.document.chunk_size,
            chunk_overlap: self.config.document.chunk_overlap,
            embedding_model: self.services.embedder.model_name().to_string(),
            embedding_dim: self.services.embedder.dimension(),
            summarizer: self.summarizer_name.clone(),
        })
    }

    pub async fn stores_exist(&self) -> Result<bool> {
        Ok(self
            .client
            .table_exists(&self.config.storage.summary_table)
            .await?
            && self
                .client
                .table_exists(&self.config.storage.detailed_table)
                .await?)
    }

    /// Loads both stores when they were built from the same source with
    /// the same settings; otherwise processes the document and rebuilds.
    pub async fn get_or_create_vector_stores(
        &self,
        source: &DocumentSource,
        force: bool,
    ) -> Result<VectorStores> {
        let settings = self.settings_for(source).await?;

        if !force && self.stores_exist().await? {
            let manifest = IndexManifest::load(&self.manifest_path()).await?;
            if manifest.is_some_and(|m| m.matches(&settings)) {
                info!("Loading existing vector stores...");
                return self.load_stores().await;
            }
            info!("Existing vector stores are stale, rebuilding");
        }

        info!("Creating new vector stores...");
        self.build_stores(source, settings).await
    }

    async fn load_stores(&self) -> Result<VectorStores> {
        let embedder = Arc::clone(&self.services.embedder);
        Ok(VectorStores {
            summary: VectorStore::load(
                &self.client,
                &self.config.storage.summary_table,
                Arc::clone(&embedder),
            )
            .await?,
            detailed: VectorStore::load(&self.client, &self.config.storage.detailed_table, embedder)
                .await?,
        })
    }

    async fn build_stores(
        &self,
        source: &DocumentSource,
        settings: IndexSettings,
    ) -> Result<VectorStores> {
        let processor = DocumentProcessor::new(&self.config, Arc::clone(&self.summarizer))?
            .with_progress(self.show_progress);
        let processed = processor.load_and_process_document(source).await?;

        // A half-written index must not be mistaken for a complete one.
        IndexManifest::remove(&self.manifest_path()).await?;

        let batch_size = self.config.storage.batch_size;
        let summary = VectorStore::from_documents(
            &self.client,
            &self.config.storage.summary_table,
            &processed.summaries,
            Arc::clone(&self.services.embedder),
            batch_size,
        )
        .await?;
        let detailed = VectorStore::from_documents(
            &self.client,
            &self.config.storage.detailed_table,
            &processed.detailed_chunks,
            Arc::clone(&self.services.embedder),
            batch_size,
        )
        .await?;

        IndexManifest::new(
            settings,
            processed.summaries.len(),
            processed.detailed_chunks.len(),
        )
        .save(&self.manifest_path())
        .await?;

        info!(
            "Vector stores created: {} summaries, {} chunks",
            processed.summaries.len(),
            processed.detailed_chunks.len()
        );
        Ok(VectorStores { summary, detailed })
    }

    pub async fn reset(&self) -> Result<()> {
        self.client
            .drop_table(&self.config.storage.summary_table)
            .await?;
        self.client
            .drop_table(&self.config.storage.detailed_table)
            .await?;
        IndexManifest::remove(&self.manifest_path()).await?;
        info!("Vector stores reset");
        Ok(())
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            uri: self.config.storage.uri.clone(),
            summary_table: self.config.storage.summary_table.clone(),
            detailed_table: self.config.storage.detailed_table.clone(),
            summary_count: self
                .client
                .count_rows(&self.config.storage.summary_table)
                .await?,
            detailed_count: self
                .client
                .count_rows(&self.config.storage.detailed_table)
                .await?,
            manifest: IndexManifest::load(&self.manifest_path()).await?,
        })
    }
}
