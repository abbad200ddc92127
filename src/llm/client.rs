// file: src/llm/client.rs
// description: OpenAI API integration for chat completions and text embeddings
// reference: https://platform.openai.com/docs/api-reference

use crate::config::LlmConfig;
use crate::error::{QaError, Result};
use crate::llm::backoff::{BackoffPolicy, retry_with_exponential_backoff};
use crate::llm::{ChatModel, Embedder};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    encoding_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Thin client over the chat-completions and embeddings endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    chat_model: String,
    temperature: f32,
    max_tokens: u32,
    embedding_model: String,
    embedding_dim: usize,
    embedding_batch_size: usize,
    retry: BackoffPolicy,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, api_key: &str, retry: BackoffPolicy) -> Result<Self> {
        info!(
            "Initializing OpenAI client: base_url={}, chat_model={}, embedding_model={}",
            config.base_url, config.chat_model, config.embedding_model
        );

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| QaError::Config(format!("Invalid API key format: {}", e)))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| QaError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            embedding_model: config.embedding_model.clone(),
            embedding_dim: config.embedding_dim,
            embedding_batch_size: config.embedding_batch_size.max(1),
            retry,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| QaError::Llm(format!("Failed to send request to {}: {}", path, e)))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<f64>().ok())
                .map(|secs| (secs * 1000.0) as u64);
            return Err(QaError::RateLimited { retry_after_ms });
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                return Err(QaError::Llm(format!(
                    "API error ({}): {}",
                    status, error_response.error.message
                )));
            }

            return Err(QaError::Llm(format!(
                "HTTP error ({}): {}",
                status, error_text
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| QaError::Llm(format!("Failed to parse {} response: {}", path, e)))
    }

    pub async fn chat(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.chat_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!("Requesting chat completion for {} chars", prompt.len());

        let response: ChatResponse = self.post_json("chat/completions", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| QaError::Llm("No completion returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts.to_vec(),
            encoding_format: "float",
        };

        debug!("Requesting embeddings for {} texts", texts.len());

        let response: EmbeddingResponse = self.post_json("embeddings", &request).await?;

        let mut data = response.data;
        if data.len() != texts.len() {
            return Err(QaError::Llm(format!(
                "Expected {} embeddings, received {}",
                texts.len(),
                data.len()
            )));
        }
        data.sort_by_key(|d| d.index);

        let embeddings: Vec<Vec<f32>> = data.into_iter().map(|d| d.embedding).collect();

        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.embedding_dim) {
            return Err(QaError::Llm(format!(
                "Embedding dimension {} does not match configured {}",
                bad.len(),
                self.embedding_dim
            )));
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.chat(prompt).await
    }

    fn model_name(&self) -> &str {
        &self.chat_model
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.embedding_batch_size) {
            let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
            let batch_embeddings =
                retry_with_exponential_backoff(&self.retry, || self.embed_batch(&refs)).await?;
            embeddings.extend(batch_embeddings);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.embedding_dim
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let mut config = Config::default_config().llm;
        config.base_url = "http://localhost:8080/v1/".to_string();

        let client = OpenAiClient::new(&config, "sk-test", BackoffPolicy::default()).unwrap();
        assert_eq!(
            client.endpoint("embeddings"),
            "http://localhost:8080/v1/embeddings"
        );
    }

    #[test]
    fn test_chat_request_serialization() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.0,
            max_tokens: 4000,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 4000);
    }

    #[test]
    fn test_invalid_api_key_rejected() {
        let config = Config::default_config().llm;
        assert!(OpenAiClient::new(&config, "bad\nkey", BackoffPolicy::default()).is_err());
    }
}
