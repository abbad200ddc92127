// file: src/loader/mod.rs
// description: document sources and page-level loading by file type
// reference: internal module structure

pub mod markdown;
pub mod normalizer;
pub mod pdf;

pub use markdown::MarkdownLoader;
pub use normalizer::TextNormalizer;
pub use pdf::PdfLoader;

use crate::error::{QaError, Result};
use crate::models::{Document, INLINE_SOURCE};
use crate::processing::splitter::RecursiveCharacterTextSplitter;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::info;

const FORM_FEED: char = '\u{000C}';

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentSource {
    File(PathBuf),
    Text(String),
}

impl DocumentSource {
    pub fn name(&self) -> String {
        match self {
            DocumentSource::File(path) => path.display().to_string(),
            DocumentSource::Text(_) => INLINE_SOURCE.to_string(),
        }
    }

    /// sha256 of the source bytes, used to detect a changed document.
    pub async fn fingerprint(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        match self {
            DocumentSource::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| QaError::FileOperation {
                    path: path.clone(),
                    source: e,
                })?;
                hasher.update(&bytes);
            }
            DocumentSource::Text(text) => hasher.update(text.as_bytes()),
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}

impl From<&Path> for DocumentSource {
    fn from(path: &Path) -> Self {
        DocumentSource::File(path.to_path_buf())
    }
}

pub struct DocumentLoader {
    splitter: RecursiveCharacterTextSplitter,
    pdf: PdfLoader,
    markdown: MarkdownLoader,
    normalizer: TextNormalizer,
}

impl DocumentLoader {
    pub fn new(splitter: RecursiveCharacterTextSplitter) -> Self {
        Self {
            splitter,
            pdf: PdfLoader::new(),
            markdown: MarkdownLoader::new(),
            normalizer: TextNormalizer::new(),
        }
    }

    pub fn load(&self, source: &DocumentSource) -> Result<Vec<Document>> {
        let pages = match source {
            DocumentSource::File(path) => self.load_file(path)?,
            DocumentSource::Text(text) => self.text_pages(INLINE_SOURCE, text),
        };

        if pages.is_empty() {
            return Err(QaError::DocumentLoad {
                source_name: source.name(),
                message: "document contains no extractable text".to_string(),
            });
        }

        info!("Loaded {} pages from {}", pages.len(), source.name());
        Ok(pages)
    }

    fn load_file(&self, path: &Path) -> Result<Vec<Document>> {
        if !path.is_file() {
            return Err(QaError::FileOperation {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "document not found"),
            });
        }

        let name = path.display().to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => self.pdf.load(path),
            "md" | "markdown" => Ok(self.markdown.to_pages(&name, &read_to_string(path)?)),
            "txt" | "text" => Ok(self.text_pages(&name, &read_to_string(path)?)),
            other => Err(QaError::DocumentLoad {
                source_name: name,
                message: format!("unsupported file type '{}'", other),
            }),
        }
    }

    fn text_pages(&self, source: &str, text: &str) -> Vec<Document> {
        if text.contains(FORM_FEED) {
            return text
                .split(FORM_FEED)
                .enumerate()
                .filter_map(|(idx, page)| {
                    let cleaned = self.normalizer.clean_extracted(page);
                    (!cleaned.is_empty()).then(|| Document::page(source, idx as u32, cleaned))
                })
                .collect();
        }

        let cleaned = self.normalizer.clean_extracted(text);
        self.splitter.create_documents(source, &cleaned)
    }
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| QaError::FileOperation {
        path: path.to_path_buf(),
        source: e,
    })
}
