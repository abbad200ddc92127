// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod app;
pub mod config;
pub mod error;
pub mod llm;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod processing;
pub mod retrieval;
pub mod server;
pub mod store;
pub mod utils;

pub use app::{HistoryEntry, QaApplication};
pub use config::{
    Config, DocumentConfig, LlmConfig, LlmProvider, RetrievalConfig, ServerConfig, StorageConfig,
    SummarizationConfig,
};
pub use error::{QaError, Result};
pub use llm::{BackoffPolicy, ChatModel, Embedder, HashingEmbedder, LlmServices, OpenAiClient};
pub use loader::{DocumentLoader, DocumentSource};
pub use models::{Document, DocumentMetadata, RetrievedChunk, SearchResult};
pub use pipeline::{IndexingStats, ProgressTracker};
pub use processing::{
    DocumentProcessor, ExtractiveSummarizer, MapReduceSummarizer, ProcessedDocument,
    RecursiveCharacterTextSplitter, Summarizer,
};
pub use retrieval::HierarchicalRetriever;
pub use server::QaServer;
pub use store::{
    IndexManifest, LanceDbClient, SearchFilter, StoreStats, VectorStore, VectorStoreManager,
    VectorStores,
};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};
