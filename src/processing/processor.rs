// file: src/processing/processor.rs
// description: turns a document source into summary and detailed chunk documents
// reference: batched concurrent summarization with pacing between batches

use crate::config::Config;
use crate::error::{QaError, Result};
use crate::loader::{DocumentLoader, DocumentSource};
use crate::models::Document;
use crate::pipeline::{IndexingStats, ProgressTracker};
use crate::processing::splitter::RecursiveCharacterTextSplitter;
use crate::processing::summarizer::Summarizer;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub summaries: Vec<Document>,
    pub detailed_chunks: Vec<Document>,
    pub stats: IndexingStats,
}

pub struct DocumentProcessor {
    loader: Arc<DocumentLoader>,
    splitter: RecursiveCharacterTextSplitter,
    summarizer: Arc<dyn Summarizer>,
    batch_size: usize,
    batch_pause: Duration,
    show_progress: bool,
}

impl DocumentProcessor {
    pub fn new(config: &Config, summarizer: Arc<dyn Summarizer>) -> Result<Self> {
        let splitter = RecursiveCharacterTextSplitter::new(
            config.document.chunk_size,
            config.document.chunk_overlap,
        )?;

        Ok(Self {
            loader: Arc::new(DocumentLoader::new(splitter.clone())),
            splitter,
            summarizer,
            batch_size: config.summarization.batch_size.max(1),
            batch_pause: Duration::from_millis(config.summarization.batch_pause_ms),
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub async fn load_and_process_document(
        &self,
        source: &DocumentSource,
    ) -> Result<ProcessedDocument> {
        let loader = Arc::clone(&self.loader);
        let owned_source = source.clone();
        let pages = tokio::task::spawn_blocking(move || loader.load(&owned_source))
            .await
            .map_err(|e| QaError::DocumentLoad {
                source_name: source.name(),
                message: format!("loader task failed: {}", e),
            })??;

        let tracker = if self.show_progress {
            ProgressTracker::new(pages.len())
        } else {
            ProgressTracker::hidden(pages.len())
        };

        let summaries = self.summarize_pages(&pages, &tracker).await?;

        let detailed_chunks = self.splitter.split_documents(&pages);
        tracker.add_chunks(detailed_chunks.len());
        tracker.finish();

        let stats = tracker.get_stats();
        info!(
            "Processed {}: {} summaries, {} chunks in {} ms ({:.2} pages/sec, {:.1} chunks/page, {:.0}% summarized)",
            source.name(),
            summaries.len(),
            detailed_chunks.len(),
            stats.duration_ms,
            stats.pages_per_second(),
            stats.chunks_per_page(),
            stats.success_rate()
        );

        Ok(ProcessedDocument {
            summaries,
            detailed_chunks,
            stats,
        })
    }

    /// Summaries come back in page order; a page that fails aborts the run
    /// once its batch has settled.
    async fn summarize_pages(
        &self,
        pages: &[Document],
        tracker: &ProgressTracker,
    ) -> Result<Vec<Document>> {
        let mut summaries = Vec::with_capacity(pages.len());
        let batch_count = pages.len().div_ceil(self.batch_size);

        for (batch_idx, batch) in pages.chunks(self.batch_size).enumerate() {
            tracker.set_message(format!("Batch {}/{}", batch_idx + 1, batch_count));

            let results = join_all(batch.iter().map(|page| self.summarizer.summarize(page))).await;

            let mut first_error = None;
            for (page, result) in batch.iter().zip(results) {
                match result {
                    Ok(text) => {
                        tracker.inc_pages_summarized(page.char_len() as u64);
                        summaries.push(Document::summary_of(page, text));
                    }
                    Err(e) => {
                        error!("Failed to summarize page {}: {}", page.metadata.page, e);
                        tracker.inc_pages_failed();
                        first_error.get_or_insert(e);
                    }
                }
            }

            if let Some(e) = first_error {
                return Err(e);
            }

            if batch_idx + 1 < batch_count && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::summarizer::ExtractiveSummarizer;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Tracks the highest number of summaries in flight at once.
    struct ConcurrencyProbe {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        fail_page: Option<u32>,
    }

    impl ConcurrencyProbe {
        fn new(fail_page: Option<u32>) -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                fail_page,
            }
        }
    }

    #[async_trait]
    impl Summarizer for ConcurrencyProbe {
        async fn summarize(&self, document: &Document) -> Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_page == Some(document.metadata.page) {
                return Err(QaError::RetriesExhausted);
            }
            Ok(format!("summary of page {}", document.metadata.page))
        }
    }

    fn paged_text(pages: usize) -> DocumentSource {
        let text = (0..pages)
            .map(|i| format!("Page {} talks about topic {}.", i, i))
            .collect::<Vec<_>>()
            .join("\u{000C}");
        DocumentSource::Text(text)
    }

    fn test_config() -> Config {
        let mut config = Config::offline();
        config.document.chunk_size = 12;
        config.document.chunk_overlap = 0;
        config
    }

    #[tokio::test]
    async fn test_one_summary_per_page() {
        let processor =
            DocumentProcessor::new(&test_config(), Arc::new(ExtractiveSummarizer::default()))
                .unwrap();

        let processed = processor
            .load_and_process_document(&paged_text(3))
            .await
            .unwrap();

        assert_eq!(processed.summaries.len(), 3);
        for (idx, summary) in processed.summaries.iter().enumerate() {
            assert!(summary.metadata.summary);
            assert_eq!(summary.metadata.page, idx as u32);
        }
        assert!(processed.detailed_chunks.len() > 3);
        assert!(processed.detailed_chunks.iter().all(|c| !c.metadata.summary));
        assert_eq!(processed.stats.pages_summarized, 3);
        assert_eq!(processed.stats.chunks_created, processed.detailed_chunks.len());
    }

    #[tokio::test]
    async fn test_batches_bound_concurrency() {
        let mut config = test_config();
        config.summarization.batch_size = 2;
        let probe = Arc::new(ConcurrencyProbe::new(None));
        let processor = DocumentProcessor::new(&config, probe.clone()).unwrap();

        let processed = processor
            .load_and_process_document(&paged_text(5))
            .await
            .unwrap();

        assert_eq!(processed.summaries.len(), 5);
        assert_eq!(probe.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_page_aborts() {
        let probe = Arc::new(ConcurrencyProbe::new(Some(1)));
        let processor = DocumentProcessor::new(&test_config(), probe).unwrap();

        let err = processor
            .load_and_process_document(&paged_text(3))
            .await
            .unwrap_err();
        assert!(matches!(err, QaError::RetriesExhausted));
    }

    #[tokio::test]
    async fn test_pause_between_batches() {
        let mut config = test_config();
        config.summarization.batch_size = 1;
        config.summarization.batch_pause_ms = 30;
        let processor =
            DocumentProcessor::new(&config, Arc::new(ExtractiveSummarizer::default())).unwrap();

        let started = std::time::Instant::now();
        processor
            .load_and_process_document(&paged_text(3))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(60));
    }
}
