// file: src/llm/mod.rs
// description: language model service traits and provider wiring
// reference: internal module structure

pub mod backoff;
pub mod client;
pub mod embeddings;

pub use backoff::{BackoffPolicy, retry_with_exponential_backoff};
pub use client::OpenAiClient;
pub use embeddings::HashingEmbedder;

use crate::config::{Config, LlmProvider};
use crate::error::{QaError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_documents(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| QaError::Llm("No embedding returned for query".to_string()))
    }

    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Chat model (absent for the offline provider) and embedder for a config.
#[derive(Clone)]
pub struct LlmServices {
    pub chat: Option<Arc<dyn ChatModel>>,
    pub embedder: Arc<dyn Embedder>,
}

impl LlmServices {
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.llm.provider {
            LlmProvider::OpenAi => {
                let api_key = config.require_api_key()?;
                let client = Arc::new(OpenAiClient::new(
                    &config.llm,
                    api_key,
                    BackoffPolicy::from_config(&config.summarization),
                )?);
                info!("Using OpenAI provider");
                Ok(Self {
                    chat: Some(client.clone()),
                    embedder: client,
                })
            }
            LlmProvider::Offline => {
                warn!("Using offline provider - hashing embeddings and extractive summaries");
                Ok(Self {
                    chat: None,
                    embedder: Arc::new(HashingEmbedder::new(config.llm.embedding_dim)),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_services() {
        let config = Config::offline();
        let services = LlmServices::from_config(&config).unwrap();
        assert!(services.chat.is_none());
        assert_eq!(services.embedder.dimension(), config.llm.embedding_dim);
    }

    #[test]
    fn test_openai_requires_key() {
        let mut config = Config::default_config();
        config.llm.api_key = None;
        assert!(LlmServices::from_config(&config).is_err());

        config.llm.api_key = Some("sk-test".to_string());
        let services = LlmServices::from_config(&config).unwrap();
        assert!(services.chat.is_some());
        assert_eq!(services.embedder.model_name(), "text-embedding-ada-002");
    }
}
