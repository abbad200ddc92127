// file: src/loader/pdf.rs
// description: per-page PDF text extraction
// reference: https://docs.rs/pdf-extract

use crate::error::{QaError, Result};
use crate::loader::normalizer::TextNormalizer;
use crate::models::Document;
use std::path::Path;
use tracing::{debug, warn};

pub struct PdfLoader {
    normalizer: TextNormalizer,
}

impl PdfLoader {
    pub fn new() -> Self {
        Self {
            normalizer: TextNormalizer::new(),
        }
    }

    pub fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let bytes = std::fs::read(path).map_err(|e| QaError::FileOperation {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.load_bytes(&path.display().to_string(), &bytes)
    }

    /// Pages keep their index in the file even when empty pages are dropped.
    pub fn load_bytes(&self, source: &str, bytes: &[u8]) -> Result<Vec<Document>> {
        let raw_pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
            QaError::DocumentLoad {
                source_name: source.to_string(),
                message: e.to_string(),
            }
        })?;

        let total = raw_pages.len();
        let pages = self.pages_from_text(source, raw_pages);

        if pages.len() < total {
            warn!(
                "Skipped {} of {} pages in {} with no extractable text",
                total - pages.len(),
                total,
                source
            );
        }
        debug!("Extracted {} pages from {}", pages.len(), source);

        Ok(pages)
    }

    fn pages_from_text(&self, source: &str, raw_pages: Vec<String>) -> Vec<Document> {
        raw_pages
            .into_iter()
            .enumerate()
            .filter_map(|(idx, text)| {
                let cleaned = self.normalizer.clean_extracted(&text);
                (!cleaned.is_empty()).then(|| Document::page(source, idx as u32, cleaned))
            })
            .collect()
    }
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self::new()
    }
}
