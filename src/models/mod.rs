// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod document;
pub mod search_result;

pub use document::{Document, DocumentMetadata, INLINE_SOURCE};
pub use search_result::{RetrievedChunk, SearchResult, score_from_distance};
