// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{QaError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the language model API credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub document: DocumentConfig,
    pub llm: LlmConfig,
    pub summarization: SummarizationConfig,
    pub retrieval: RetrievalConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentConfig {
    pub path: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Offline,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub embedding_batch_size: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummarizationConfig {
    pub batch_size: usize,
    pub batch_pause_ms: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    /// Approximate token budget for a single map-reduce prompt.
    pub token_max: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    pub k_summaries: usize,
    pub k_chunks: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub uri: String,
    pub summary_table: String,
    pub detailed_table: String,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub history_limit: usize,
    pub cors_enabled: bool,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| QaError::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(
                config::File::from(Path::new("config/default.toml")).required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("HIERARCHICAL_QA")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| QaError::Config(e.to_string()))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| QaError::Config(e.to_string()))?;

        if config.llm.api_key.is_none() {
            config.llm.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            document: DocumentConfig {
                path: PathBuf::from("./data/intro_to_algo_book.pdf"),
                chunk_size: 1000,
                chunk_overlap: 200,
            },
            llm: LlmConfig {
                provider: LlmProvider::OpenAi,
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                chat_model: "gpt-4o-mini".to_string(),
                temperature: 0.0,
                max_tokens: 4000,
                embedding_model: "text-embedding-ada-002".to_string(),
                embedding_dim: 1536,
                embedding_batch_size: 100,
                timeout_secs: 60,
            },
            summarization: SummarizationConfig {
                batch_size: 5,
                batch_pause_ms: 1000,
                max_retries: 5,
                backoff_base_ms: 1000,
                token_max: 3000,
            },
            retrieval: RetrievalConfig {
                k_summaries: 3,
                k_chunks: 5,
            },
            storage: StorageConfig {
                uri: "./vector_stores".to_string(),
                summary_table: "summary_store".to_string(),
                detailed_table: "detailed_store".to_string(),
                batch_size: 256,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8501,
                history_limit: 50,
                cors_enabled: false,
            },
        }
    }

    /// Defaults wired for local runs without network access.
    pub fn offline() -> Self {
        let mut config = Self::default_config();
        config.llm.provider = LlmProvider::Offline;
        config.llm.embedding_model = "hashing-bow".to_string();
        config.llm.embedding_dim = 256;
        config.summarization.batch_pause_ms = 0;
        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.document.chunk_size == 0 {
            return Err(QaError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.document.chunk_overlap >= self.document.chunk_size {
            return Err(QaError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.document.chunk_overlap, self.document.chunk_size
            )));
        }

        if self.summarization.batch_size == 0 {
            return Err(QaError::Config(
                "summarization batch_size must be greater than 0".to_string(),
            ));
        }

        if self.storage.batch_size == 0 || self.llm.embedding_batch_size == 0 {
            return Err(QaError::Config(
                "batch sizes must be greater than 0".to_string(),
            ));
        }

        if self.llm.embedding_dim == 0 {
            return Err(QaError::Config(
                "embedding_dim must be greater than 0".to_string(),
            ));
        }

        if self.storage.summary_table == self.storage.detailed_table {
            return Err(QaError::Config(
                "summary_table and detailed_table must differ".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(QaError::Config("server port cannot be 0".to_string()));
        }

        Ok(())
    }

    /// Credential required by the configured provider, if any.
    pub fn require_api_key(&self) -> Result<&str> {
        self.llm.api_key.as_deref().ok_or_else(|| {
            QaError::Config(format!(
                "{} is not set; export it or switch llm.provider to \"offline\"",
                API_KEY_ENV
            ))
        })
    }
}
