// file: src/store/vector_store.rs
// description: embedding-backed document table with filtered similarity search
// reference: https://docs.rs/lancedb

use crate::error::{QaError, Result};
use crate::llm::Embedder;
use crate::models::{Document, SearchResult};
use crate::store::client::LanceDbClient;
use crate::store::schema::{
    EMBEDDING_COLUMN, batch_to_results, documents_schema, documents_to_batch,
};
use arrow_array::RecordBatchIterator;
use futures::StreamExt;
use lancedb::Table;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;
use tracing::{debug, info};

/// Row restriction applied to a similarity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFilter {
    Page(u32),
}

impl SearchFilter {
    pub fn to_predicate(&self) -> String {
        match self {
            SearchFilter::Page(page) => format!("page = {}", page),
        }
    }
}

#[derive(Clone)]
pub struct VectorStore {
    table: Table,
    table_name: String,
    embedder: Arc<dyn Embedder>,
}

impl VectorStore {
    /// Embeds `documents` in batches of `batch_size` and writes them to a
    /// fresh `table_name`, replacing any existing table of that name.
    pub async fn from_documents(
        client: &LanceDbClient,
        table_name: &str,
        documents: &[Document],
        embedder: Arc<dyn Embedder>,
        batch_size: usize,
    ) -> Result<Self> {
        client.drop_table(table_name).await?;

        let dim = embedder.dimension();
        let schema = documents_schema(dim);

        if documents.is_empty() {
            let table = client
                .get_connection()
                .create_empty_table(table_name, schema)
                .execute()
                .await
                .map_err(|e| QaError::VectorStore(format!("Failed to create table: {}", e)))?;
            info!("Created empty table: {}", table_name);
            return Ok(Self {
                table,
                table_name: table_name.to_string(),
                embedder,
            });
        }

        let mut table: Option<Table> = None;
        for (batch_idx, batch) in documents.chunks(batch_size.max(1)).enumerate() {
            let texts: Vec<String> = batch.iter().map(|d| d.page_content.clone()).collect();
            let embeddings = embedder.embed_documents(&texts).await?;
            let record_batch = documents_to_batch(schema.clone(), batch, &embeddings, dim)?;
            let reader = RecordBatchIterator::new(vec![Ok(record_batch)], schema.clone());

            match &table {
                None => {
                    let created = client
                        .get_connection()
                        .create_table(table_name, reader)
                        .execute()
                        .await
                        .map_err(|e| {
                            QaError::VectorStore(format!("Failed to create table: {}", e))
                        })?;
                    info!("Created new table: {}", table_name);
                    table = Some(created);
                }
                Some(existing) => {
                    existing.add(reader).execute().await.map_err(|e| {
                        QaError::VectorStore(format!("Failed to insert documents: {}", e))
                    })?;
                }
            }

            debug!(
                "Wrote batch {} ({} documents) to {}",
                batch_idx + 1,
                batch.len(),
                table_name
            );
        }

        let table = table.ok_or_else(|| {
            QaError::VectorStore(format!("No batches written to {}", table_name))
        })?;

        info!("Stored {} documents in {}", documents.len(), table_name);
        Ok(Self {
            table,
            table_name: table_name.to_string(),
            embedder,
        })
    }

    pub async fn load(
        client: &LanceDbClient,
        table_name: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        if !client.table_exists(table_name).await? {
            return Err(QaError::VectorStore(format!(
                "Table {} does not exist",
                table_name
            )));
        }

        let table = client.get_table(table_name).await?;
        debug!("Loaded table: {}", table_name);

        Ok(Self {
            table,
            table_name: table_name.to_string(),
            embedder,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub async fn count(&self) -> Result<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| QaError::VectorStore(format!("Failed to count rows: {}", e)))
    }

    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<SearchFilter>,
    ) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed_query(query).await?;
        self.similarity_search_by_vector(&embedding, k, filter).await
    }

    /// Up to `k` rows ordered by ascending distance to `embedding`.
    pub async fn similarity_search_by_vector(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<SearchFilter>,
    ) -> Result<Vec<SearchResult>> {
        if k == 0 || self.count().await? == 0 {
            return Ok(Vec::new());
        }

        let mut query = self
            .table
            .vector_search(embedding.to_vec())
            .map_err(|e| QaError::VectorStore(format!("Failed to create vector search: {}", e)))?
            .column(EMBEDDING_COLUMN)
            .limit(k);

        if let Some(filter) = filter {
            query = query.only_if(filter.to_predicate());
        }

        let mut results_stream = query
            .execute()
            .await
            .map_err(|e| QaError::VectorStore(format!("Vector search failed: {}", e)))?;

        let mut results = Vec::new();
        while let Some(batch_result) = results_stream.next().await {
            let batch = batch_result.map_err(|e| {
                QaError::VectorStore(format!("Failed to read result batch: {}", e))
            })?;
            results.extend(batch_to_results(&batch)?);
        }

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(k);

        debug!(
            "Search on {} ({:?}) returned {} results",
            self.table_name,
            filter,
            results.len()
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::HashingEmbedder;
    use tempfile::TempDir;

    async fn client(temp: &TempDir) -> LanceDbClient {
        LanceDbClient::new(&temp.path().join("db").display().to_string())
            .await
            .unwrap()
    }

    fn chunks() -> Vec<Document> {
        let sorting = Document::page("book.pdf", 0, "");
        let graphs = Document::page("book.pdf", 1, "");
        vec![
            Document::chunk_of(&sorting, 0, "quicksort picks a pivot and partitions"),
            Document::chunk_of(&sorting, 1, "mergesort splits the array in halves"),
            Document::chunk_of(&graphs, 0, "dijkstra computes shortest paths"),
            Document::chunk_of(&graphs, 1, "breadth first search visits neighbours"),
        ]
    }

    #[tokio::test]
    async fn test_from_documents_and_search() {
        let temp = TempDir::new().unwrap();
        let client = client(&temp).await;
        let embedder = Arc::new(HashingEmbedder::new(64));

        let store = VectorStore::from_documents(&client, "detailed_store", &chunks(), embedder, 3)
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 4);

        let results = store
            .similarity_search("quicksort pivot", 2, None)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].document.page_content.contains("quicksort"));
        assert!(results[0].distance <= results[1].distance);
    }

    #[tokio::test]
    async fn test_page_filter_restricts_results() {
        let temp = TempDir::new().unwrap();
        let client = client(&temp).await;
        let embedder = Arc::new(HashingEmbedder::new(64));
        let store = VectorStore::from_documents(&client, "detailed_store", &chunks(), embedder, 10)
            .await
            .unwrap();

        let results = store
            .similarity_search("quicksort pivot", 5, Some(SearchFilter::Page(1)))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.document.metadata.page == 1));
    }

    #[tokio::test]
    async fn test_zero_k_and_reload() {
        let temp = TempDir::new().unwrap();
        let client = client(&temp).await;
        let embedder = Arc::new(HashingEmbedder::new(32));
        VectorStore::from_documents(&client, "summary_store", &chunks(), embedder.clone(), 10)
            .await
            .unwrap();

        let store = VectorStore::load(&client, "summary_store", embedder.clone())
            .await
            .unwrap();
        assert!(store.similarity_search("anything", 0, None).await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 4);

        assert!(VectorStore::load(&client, "missing", embedder).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_store_returns_nothing() {
        let temp = TempDir::new().unwrap();
        let client = client(&temp).await;
        let embedder = Arc::new(HashingEmbedder::new(32));

        let store = VectorStore::from_documents(&client, "summary_store", &[], embedder, 10)
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.similarity_search("x", 3, None).await.unwrap().is_empty());
        assert!(
            store
                .similarity_search("x", 3, Some(SearchFilter::Page(0)))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_rebuild_replaces_rows() {
        let temp = TempDir::new().unwrap();
        let client = client(&temp).await;
        let embedder = Arc::new(HashingEmbedder::new(32));
        VectorStore::from_documents(&client, "t", &chunks(), embedder.clone(), 10)
            .await
            .unwrap();

        let store = VectorStore::from_documents(&client, "t", &chunks()[..1], embedder, 10)
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[test]
    fn test_filter_predicate() {
        assert_eq!(SearchFilter::Page(7).to_predicate(), "page = 7");
    }
}
