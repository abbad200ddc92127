// file: src/models/document.rs
// description: page, summary and chunk documents with their metadata
// reference: internal data structures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Source name recorded for documents built from inline text.
pub const INLINE_SOURCE: &str = "<inline>";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: String,
    /// 0-based page (or section) index assigned by the loader.
    pub page: u32,
    pub summary: bool,
    pub chunk_index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn page(source: impl Into<String>, page: u32, content: impl Into<String>) -> Self {
        Self {
            page_content: content.into(),
            metadata: DocumentMetadata {
                source: source.into(),
                page,
                summary: false,
                chunk_index: None,
            },
        }
    }

    pub fn summary_of(page: &Document, summary: impl Into<String>) -> Self {
        Self {
            page_content: summary.into(),
            metadata: DocumentMetadata {
                source: page.metadata.source.clone(),
                page: page.metadata.page,
                summary: true,
                chunk_index: None,
            },
        }
    }

    pub fn chunk_of(page: &Document, chunk_index: u32, content: impl Into<String>) -> Self {
        Self {
            page_content: content.into(),
            metadata: DocumentMetadata {
                chunk_index: Some(chunk_index),
                ..page.metadata.clone()
            },
        }
    }

    /// Stable row id: hash of the metadata and content.
    pub fn id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.metadata.source.as_bytes());
        hasher.update(self.metadata.page.to_le_bytes());
        hasher.update([self.metadata.summary as u8]);
        if let Some(idx) = self.metadata.chunk_index {
            hasher.update(idx.to_le_bytes());
        }
        hasher.update(self.page_content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// First `max_chars` characters of the content.
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.page_content.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.page_content[..idx],
            None => &self.page_content,
        }
    }

    pub fn char_len(&self) -> usize {
        self.page_content.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_and_chunk_inherit_page() {
        let page = Document::page("book.pdf", 4, "QuickSelect finds the k-th smallest element.");

        let summary = Document::summary_of(&page, "Selection algorithm");
        assert!(summary.metadata.summary);
        assert_eq!(summary.metadata.page, 4);
        assert_eq!(summary.metadata.source, "book.pdf");

        let chunk = Document::chunk_of(&page, 2, "k-th smallest");
        assert!(!chunk.metadata.summary);
        assert_eq!(chunk.metadata.chunk_index, Some(2));
        assert_eq!(chunk.metadata.page, 4);
    }

    #[test]
    fn test_id_is_stable_and_distinguishes_levels() {
        let page = Document::page("book.pdf", 1, "same text");
        let summary = Document::summary_of(&page, "same text");

        assert_eq!(page.id(), page.clone().id());
        assert_ne!(page.id(), summary.id());
    }

    #[test]
    fn test_preview_is_char_safe() {
        let doc = Document::page(INLINE_SOURCE, 0, "héllo wörld");
        assert_eq!(doc.preview(4), "héll");
        assert_eq!(doc.preview(100), "héllo wörld");
        assert_eq!(doc.char_len(), 11);
    }
}
