// file: src/utils/validation.rs
// description: input validation for queries, retrieval limits and document paths
// reference: input validation patterns

use crate::error::{QaError, Result};
use std::path::Path;

pub const MAX_QUERY_CHARS: usize = 2000;
pub const MAX_K: usize = 50;

const SUPPORTED_EXTENSIONS: [&str; 5] = ["pdf", "md", "markdown", "txt", "text"];

pub struct Validator;

impl Validator {
    /// Trimmed query, rejected when blank or longer than `MAX_QUERY_CHARS`.
    pub fn validate_query(query: &str) -> Result<&str> {
        let trimmed = query.trim();

        if trimmed.is_empty() {
            return Err(QaError::Validation("Query is empty".to_string()));
        }

        let len = trimmed.chars().count();
        if len > MAX_QUERY_CHARS {
            return Err(QaError::Validation(format!(
                "Query too long ({} characters, max {})",
                len, MAX_QUERY_CHARS
            )));
        }

        Ok(trimmed)
    }

    pub fn validate_k(name: &str, k: usize) -> Result<usize> {
        if k == 0 || k > MAX_K {
            return Err(QaError::Validation(format!(
                "{} must be between 1 and {} (got {})",
                name, MAX_K, k
            )));
        }
        Ok(k)
    }

    pub fn validate_document_path(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(QaError::Validation(format!(
                "Document does not exist: {}",
                path.display()
            )));
        }

        if !path.is_file() {
            return Err(QaError::Validation(format!(
                "Document path is not a file: {}",
                path.display()
            )));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension {
            Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
            _ => Err(QaError::Validation(format!(
                "Unsupported document type: {} (expected one of {})",
                path.display(),
                SUPPORTED_EXTENSIONS.join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_query() {
        assert_eq!(
            Validator::validate_query("  How does Quicksort work?  ").unwrap(),
            "How does Quicksort work?"
        );
        assert!(Validator::validate_query("").is_err());
        assert!(Validator::validate_query(" \n\t ").is_err());
        assert!(Validator::validate_query(&"q".repeat(MAX_QUERY_CHARS)).is_ok());
        assert!(Validator::validate_query(&"q".repeat(MAX_QUERY_CHARS + 1)).is_err());
    }

    #[test]
    fn test_validate_k() {
        assert_eq!(Validator::validate_k("k_chunks", 5).unwrap(), 5);
        assert!(Validator::validate_k("k_chunks", 0).is_err());
        assert!(Validator::validate_k("k_chunks", MAX_K + 1).is_err());
    }

    #[test]
    fn test_validate_document_path() {
        let temp = TempDir::new().unwrap();
        let pdf = temp.path().join("book.PDF");
        fs::write(&pdf, "x").unwrap();
        let csv = temp.path().join("data.csv");
        fs::write(&csv, "x").unwrap();

        assert!(Validator::validate_document_path(&pdf).is_ok());
        assert!(Validator::validate_document_path(&csv).is_err());
        assert!(Validator::validate_document_path(temp.path()).is_err());
        assert!(Validator::validate_document_path(&temp.path().join("nope.pdf")).is_err());
    }
}
