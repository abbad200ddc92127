// file: src/processing/splitter.rs
// description: recursive character text splitter for page and chunk documents
// reference: separator-priority splitting with greedy merge and overlap

use crate::error::{QaError, Result};
use crate::models::Document;
use std::collections::VecDeque;
use tracing::{debug, warn};

pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text on the first separator present in it, recursing into pieces
/// that are still too long, then merges small pieces back up to
/// `chunk_size` characters with `chunk_overlap` characters carried over.
#[derive(Debug, Clone)]
pub struct RecursiveCharacterTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(QaError::Config("chunk_size must be greater than 0".to_string()));
        }
        if chunk_overlap > chunk_size {
            return Err(QaError::Config(format!(
                "Got a larger chunk overlap ({}) than chunk size ({}), should be smaller",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Splits every page and numbers the chunks within their page.
    pub fn split_documents(&self, pages: &[Document]) -> Vec<Document> {
        let mut chunks = Vec::new();

        for page in pages {
            let pieces = self.split_text(&page.page_content);
            debug!(
                "Page {} of {} split into {} chunks",
                page.metadata.page,
                page.metadata.source,
                pieces.len()
            );
            chunks.extend(
                pieces
                    .into_iter()
                    .enumerate()
                    .map(|(idx, text)| Document::chunk_of(page, idx as u32, text)),
            );
        }

        chunks
    }

    /// Builds page-level documents from raw text, one page per piece.
    pub fn create_documents(&self, source: &str, text: &str) -> Vec<Document> {
        self.split_text(text)
            .into_iter()
            .enumerate()
            .map(|(idx, piece)| Document::page(source, idx as u32, piece))
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        let mut separator = separators.last().cloned().unwrap_or_default();
        let mut next_separators: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = candidate.clone();
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate.clone();
                next_separators = &separators[i + 1..];
                break;
            }
        }

        let mut good_splits: Vec<String> = Vec::new();
        for piece in split_keeping_separator(text, &separator) {
            if char_len(&piece) < self.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if next_separators.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    final_chunks.push(trimmed.to_string());
                }
            } else {
                final_chunks.extend(self.split_recursive(&piece, next_separators));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    fn merge_splits(&self, splits: &[String]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for split in splits {
            let len = char_len(split);

            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, self.chunk_size
                    );
                }

                if !current.is_empty() {
                    if let Some(doc) = join_pieces(&current) {
                        docs.push(doc);
                    }

                    while total > self.chunk_overlap
                        || (total + len > self.chunk_size && total > 0)
                    {
                        match current.pop_front() {
                            Some((_, dropped)) => total -= dropped,
                            None => break,
                        }
                    }
                }
            }

            current.push_back((split.as_str(), len));
            total += len;
        }

        if let Some(doc) = join_pieces(&current) {
            docs.push(doc);
        }

        docs
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Splits on `separator`, prefixing each piece after the first with it.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(|c| c.to_string()).collect();
    }

    let mut parts = text.split(separator);
    let mut pieces = Vec::new();

    if let Some(first) = parts.next() {
        pieces.push(first.to_string());
    }
    pieces.extend(parts.map(|part| format!("{}{}", separator, part)));

    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}

fn join_pieces(pieces: &VecDeque<(&str, usize)>) -> Option<String> {
    let joined: String = pieces.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = RecursiveCharacterTextSplitter::new(1000, 200).unwrap();
        assert_eq!(splitter.split_text("  Hello world  "), vec!["Hello world"]);
    }

    #[test]
    fn test_words_merged_without_overlap() {
        let splitter = RecursiveCharacterTextSplitter::new(10, 0).unwrap();
        assert_eq!(
            splitter.split_text("aaaa bbbb cccc dddd"),
            vec!["aaaa bbbb", "cccc dddd"]
        );
    }

    #[test]
    fn test_overlap_carries_previous_piece() {
        let splitter = RecursiveCharacterTextSplitter::new(10, 5).unwrap();
        assert_eq!(
            splitter.split_text("aaaa bbbb cccc dddd"),
            vec!["aaaa bbbb", "bbbb cccc", "cccc dddd"]
        );
    }

    #[test]
    fn test_falls_back_to_characters() {
        let splitter = RecursiveCharacterTextSplitter::new(4, 0).unwrap();
        assert_eq!(splitter.split_text("abcdefghij"), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_whitespace_only_pieces_dropped() {
        let splitter = RecursiveCharacterTextSplitter::new(1, 0).unwrap();
        assert_eq!(splitter.split_text("a b"), vec!["a", "b"]);
    }

    #[test]
    fn test_paragraph_separator_preferred() {
        let splitter = RecursiveCharacterTextSplitter::new(20, 0).unwrap();
        assert_eq!(
            splitter.split_text("para one.\n\npara two is here."),
            vec!["para one.", "para two is here."]
        );
    }

    #[test]
    fn test_chunks_respect_size_limit() {
        let splitter = RecursiveCharacterTextSplitter::new(100, 20).unwrap();
        let text = "QuickSelect partitions the array around a pivot. ".repeat(40)
            + "\n\n"
            + &"Median of medians guarantees linear time.\n".repeat(30);

        let chunks = splitter.split_text(&text);
        assert!(chunks.len() > 10);
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));
        assert!(chunks.iter().all(|c| !c.trim().is_empty()));
    }

    #[test]
    fn test_split_documents_copies_metadata() {
        let splitter = RecursiveCharacterTextSplitter::new(10, 0).unwrap();
        let pages = vec![
            Document::page("book.pdf", 3, "aaaa bbbb cccc dddd"),
            Document::page("book.pdf", 4, "eeee"),
        ];

        let chunks = splitter.split_documents(&pages);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].metadata.page, 3);
        assert_eq!(chunks[0].metadata.chunk_index, Some(0));
        assert_eq!(chunks[1].metadata.chunk_index, Some(1));
        assert_eq!(chunks[2].metadata.page, 4);
        assert_eq!(chunks[2].metadata.chunk_index, Some(0));
        assert!(chunks.iter().all(|c| !c.metadata.summary));
    }

    #[test]
    fn test_create_documents_numbers_pages() {
        let splitter = RecursiveCharacterTextSplitter::new(10, 0).unwrap();
        let pages = splitter.create_documents("<inline>", "aaaa bbbb cccc dddd");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].metadata.page, 1);
        assert_eq!(pages[1].metadata.chunk_index, None);
    }

    #[test]
    fn test_invalid_overlap() {
        assert!(RecursiveCharacterTextSplitter::new(10, 11).is_err());
        assert!(RecursiveCharacterTextSplitter::new(0, 0).is_err());
    }
}
