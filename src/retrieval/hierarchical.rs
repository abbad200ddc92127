// file: src/retrieval/hierarchical.rs
// description: two-level retrieval, summaries first then chunks of their pages
// reference: summary search narrows the detailed search to one page at a time

use crate::error::Result;
use crate::models::RetrievedChunk;
use crate::store::{SearchFilter, VectorStore, VectorStores};
use crate::utils::telemetry::OperationTimer;
use std::time::Duration;
use tracing::debug;

const SLOW_RETRIEVAL: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct HierarchicalRetriever {
    summary_store: VectorStore,
    detailed_store: VectorStore,
}

impl HierarchicalRetriever {
    pub fn new(summary_store: VectorStore, detailed_store: VectorStore) -> Self {
        Self {
            summary_store,
            detailed_store,
        }
    }

    pub fn from_stores(stores: &VectorStores) -> Self {
        Self::new(stores.summary.clone(), stores.detailed.clone())
    }

    /// Top `k_summaries` summaries, then for each of them (best first) the
    /// top `k_chunks` detailed chunks of the same page.
    pub async fn retrieve(
        &self,
        query: &str,
        k_summaries: usize,
        k_chunks: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let timer = OperationTimer::new("hierarchical_retrieve");

        if k_summaries == 0 || k_chunks == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.summary_store.embedder().embed_query(query).await?;

        let top_summaries = self
            .summary_store
            .similarity_search_by_vector(&embedding, k_summaries, None)
            .await?;

        let mut relevant_chunks = Vec::with_capacity(top_summaries.len() * k_chunks);
        for (rank, summary) in top_summaries.iter().enumerate() {
            let page = summary.document.metadata.page;
            let page_chunks = self
                .detailed_store
                .similarity_search_by_vector(&embedding, k_chunks, Some(SearchFilter::Page(page)))
                .await?;

            debug!(
                "Summary {} (page {}) yielded {} chunks",
                rank,
                page,
                page_chunks.len()
            );
            relevant_chunks.extend(
                page_chunks
                    .into_iter()
                    .map(|result| RetrievedChunk::from_result(result, rank)),
            );
        }

        timer.warn_if_slow(SLOW_RETRIEVAL);
        timer.finish();
        Ok(relevant_chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::HashingEmbedder;
    use crate::models::Document;
    use crate::store::LanceDbClient;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn build(temp: &TempDir) -> HierarchicalRetriever {
        let client = LanceDbClient::new(&temp.path().join("db").display().to_string())
            .await
            .unwrap();
        let embedder = Arc::new(HashingEmbedder::new(128));

        let pages = [
            Document::page("book.pdf", 0, "quicksort partition pivot"),
            Document::page("book.pdf", 1, "dijkstra shortest path graph"),
            Document::page("book.pdf", 2, "heap priority queue extract"),
        ];
        let summaries: Vec<Document> = pages
            .iter()
            .map(|p| Document::summary_of(p, p.page_content.clone()))
            .collect();

        let mut chunks = Vec::new();
        for page in &pages {
            for idx in 0..4u32 {
                chunks.push(Document::chunk_of(
                    page,
                    idx,
                    format!("{} detail number {}", page.page_content, idx),
                ));
            }
        }

        let summary = VectorStore::from_documents(&client, "summary_store", &summaries, embedder.clone(), 100)
            .await
            .unwrap();
        let detailed = VectorStore::from_documents(&client, "detailed_store", &chunks, embedder, 100)
            .await
            .unwrap();
        HierarchicalRetriever::new(summary, detailed)
    }

    #[tokio::test]
    async fn test_chunks_follow_summary_rank() {
        let temp = TempDir::new().unwrap();
        let retriever = build(&temp).await;

        let results = retriever
            .retrieve("how does quicksort choose a pivot", 2, 3)
            .await
            .unwrap();

        assert_eq!(results.len(), 6);
        assert_eq!(results[0].page(), 0);
        assert!(results[..3].iter().all(|c| c.summary_rank == 0 && c.page() == 0));
        assert!(results[3..].iter().all(|c| c.summary_rank == 1));
        let second_page = results[3].page();
        assert_ne!(second_page, 0);
        assert!(results[3..].iter().all(|c| c.page() == second_page));
    }

    #[tokio::test]
    async fn test_result_bound_and_zero_k() {
        let temp = TempDir::new().unwrap();
        let retriever = build(&temp).await;

        let results = retriever.retrieve("graph", 3, 5).await.unwrap();
        assert_eq!(results.len(), 12);
        assert!(results.len() <= 3 * 5);

        assert!(retriever.retrieve("graph", 0, 5).await.unwrap().is_empty());
        assert!(retriever.retrieve("graph", 3, 0).await.unwrap().is_empty());
    }
}
