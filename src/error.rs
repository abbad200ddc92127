// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QaError>;

#[derive(Error, Debug)]
pub enum QaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to load document {source_name}: {message}")]
    DocumentLoad {
        source_name: String,
        message: String,
    },

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("Rate limit hit (retry after: {retry_after_ms:?} ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Max retries reached")]
    RetriesExhausted,

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl QaError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, QaError::RateLimited { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, QaError::Validation(_))
    }

    /// Stable machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            QaError::Config(_) => "CONFIG",
            QaError::FileOperation { .. } => "FILE_OPERATION",
            QaError::DocumentLoad { .. } => "DOCUMENT_LOAD",
            QaError::Llm(_) => "LLM",
            QaError::RateLimited { .. } => "RATE_LIMITED",
            QaError::RetriesExhausted => "RETRIES_EXHAUSTED",
            QaError::VectorStore(_) => "VECTOR_STORE",
            QaError::Validation(_) => "VALIDATION",
            QaError::Io(_) => "IO",
            QaError::Serialization(_) => "SERIALIZATION",
        }
    }
}

impl From<lancedb::Error> for QaError {
    fn from(err: lancedb::Error) -> Self {
        QaError::VectorStore(err.to_string())
    }
}

impl From<arrow_schema::ArrowError> for QaError {
    fn from(err: arrow_schema::ArrowError) -> Self {
        QaError::VectorStore(err.to_string())
    }
}

impl From<serde_json::Error> for QaError {
    fn from(err: serde_json::Error) -> Self {
        QaError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_classification() {
        assert!(QaError::RateLimited { retry_after_ms: None }.is_rate_limit());
        assert!(!QaError::Llm("boom".to_string()).is_rate_limit());
        assert!(!QaError::RetriesExhausted.is_rate_limit());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(QaError::Validation("x".to_string()).code(), "VALIDATION");
        assert_eq!(QaError::RetriesExhausted.code(), "RETRIES_EXHAUSTED");
        assert_eq!(QaError::RetriesExhausted.to_string(), "Max retries reached");
    }
}
