// file: src/store/manifest.rs
// description: persisted record of how the vector stores were built
// reference: json metadata file kept next to the tables

use crate::error::{QaError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Settings that decide whether existing stores can be reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    pub source: String,
    pub fingerprint: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub summarizer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    #[serde(flatten)]
    pub settings: IndexSettings,
    pub summary_count: usize,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}

impl IndexManifest {
    pub fn new(settings: IndexSettings, summary_count: usize, chunk_count: usize) -> Self {
        Self {
            settings,
            summary_count,
            chunk_count,
            created_at: Utc::now(),
        }
    }

    pub fn path_for(storage_uri: &str) -> PathBuf {
        Path::new(storage_uri).join(MANIFEST_FILE)
    }

    pub fn matches(&self, settings: &IndexSettings) -> bool {
        &self.settings == settings
    }

    /// A missing or unreadable manifest loads as `None`.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            debug!("No manifest found at {:?}", path);
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| QaError::FileOperation {
                path: path.to_path_buf(),
                source: e,
            })?;

        match serde_json::from_str(&contents) {
            Ok(manifest) => Ok(Some(manifest)),
            Err(e) => {
                warn!("Ignoring unreadable manifest {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| QaError::FileOperation {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
            .await
            .map_err(|e| QaError::FileOperation {
                path: path.to_path_buf(),
                source: e,
            })?;

        debug!("Saved manifest to {:?}", path);
        Ok(())
    }

    pub async fn remove(path: &Path) -> Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(QaError::FileOperation {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn settings() -> IndexSettings {
        IndexSettings {
            source: "book.pdf".to_string(),
            fingerprint: "abc123".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            embedding_model: "hashing-bow".to_string(),
            embedding_dim: 256,
            summarizer: "extractive".to_string(),
        }
    }

    #[tokio::test]
    async fn test_manifest_persistence() {
        let dir = tempdir().unwrap();
        let path = IndexManifest::path_for(&dir.path().join("stores").display().to_string());

        IndexManifest::new(settings(), 12, 40).save(&path).await.unwrap();

        let loaded = IndexManifest::load(&path).await.unwrap().unwrap();
        assert!(loaded.matches(&settings()));
        assert_eq!(loaded.summary_count, 12);
        assert_eq!(loaded.chunk_count, 40);

        let mut changed = settings();
        changed.fingerprint = "def456".to_string();
        assert!(!loaded.matches(&changed));

        assert!(IndexManifest::remove(&path).await.unwrap());
        assert!(!IndexManifest::remove(&path).await.unwrap());
        assert!(IndexManifest::load(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_manifest_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        std::fs::write(&path, "{not json").unwrap();

        assert!(IndexManifest::load(&path).await.unwrap().is_none());
    }
}
