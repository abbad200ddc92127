// file: src/server/types.rs
// description: json request and response bodies for the http api
// reference: https://docs.rs/serde

use crate::app::HistoryEntry;
use crate::error::QaError;
use crate::models::RetrievedChunk;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub k_summaries: Option<usize>,
    #[serde(default)]
    pub k_chunks: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkJson {
    pub page: u32,
    pub content: String,
    pub source: String,
    pub chunk_index: Option<u32>,
    pub summary_rank: usize,
    pub distance: f32,
    pub score: f32,
}

impl From<&RetrievedChunk> for ChunkJson {
    fn from(chunk: &RetrievedChunk) -> Self {
        Self {
            page: chunk.page(),
            content: chunk.document.page_content.clone(),
            source: chunk.document.metadata.source.clone(),
            chunk_index: chunk.document.metadata.chunk_index,
            summary_rank: chunk.summary_rank,
            distance: chunk.distance,
            score: chunk.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub id: Uuid,
    pub query: String,
    pub results: Vec<ChunkJson>,
    pub timestamp: DateTime<Utc>,
}

impl From<&HistoryEntry> for QueryResponse {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id,
            query: entry.query.clone(),
            results: entry.results.iter().map(ChunkJson::from).collect(),
            timestamp: entry.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub entries: Vec<QueryResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&QaError> for ErrorResponse {
    fn from(err: &QaError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}
