// file: src/models/search_result.rs
// description: Search result models with similarity scores
// reference: Used for vector similarity search results

use crate::models::Document;
use serde::{Deserialize, Serialize};

/// A document returned by a vector store query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Document,

    /// L2 distance reported by the store (lower is more similar)
    pub distance: f32,

    /// Similarity score in (0, 1], derived as 1 / (1 + distance)
    pub score: f32,
}

impl SearchResult {
    pub fn new(document: Document, distance: f32) -> Self {
        Self {
            document,
            distance,
            score: score_from_distance(distance),
        }
    }
}

/// A detailed chunk reached through one of the top-ranked summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub document: Document,
    pub distance: f32,
    pub score: f32,
    /// Rank of the summary that led to this chunk (0 = best)
    pub summary_rank: usize,
}

impl RetrievedChunk {
    pub fn from_result(result: SearchResult, summary_rank: usize) -> Self {
        Self {
            document: result.document,
            distance: result.distance,
            score: result.score,
            summary_rank,
        }
    }

    pub fn page(&self) -> u32 {
        self.document.metadata.page
    }

    /// `Page: N`, the first `max_content_len` characters followed by `...`,
    /// then a `---` separator.
    pub fn format_summary(&self, max_content_len: usize) -> String {
        format!(
            "Page: {}\nContent: {}...\n---",
            self.page(),
            self.document.preview(max_content_len)
        )
    }
}

pub fn score_from_distance(distance: f32) -> f32 {
    1.0 / (1.0 + distance.max(0.0))
}
