// file: src/pipeline/progress.rs
// description: progress bars and counters for the summarization pass
// reference: uses indicatif for progress bars and tracks processing metrics

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexingStats {
    pub pages_loaded: usize,
    pub pages_summarized: usize,
    pub pages_failed: usize,
    pub chunks_created: usize,
    pub total_chars_processed: u64,
    pub duration_ms: u64,
}

impl IndexingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages_per_second(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.pages_summarized as f64 * 1000.0 / self.duration_ms as f64
    }

    pub fn chunks_per_page(&self) -> f64 {
        if self.pages_loaded == 0 {
            return 0.0;
        }
        self.chunks_created as f64 / self.pages_loaded as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.pages_summarized + self.pages_failed;
        if total == 0 {
            return 0.0;
        }
        (self.pages_summarized as f64 / total as f64) * 100.0
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    pages_loaded: usize,
    pages_summarized: Arc<AtomicUsize>,
    pages_failed: Arc<AtomicUsize>,
    chunks_created: Arc<AtomicUsize>,
    chars_processed: Arc<AtomicU64>,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_pages: usize) -> Self {
        Self::with_color(total_pages, true)
    }

    pub fn with_color(total_pages: usize, colored: bool) -> Self {
        Self::build(total_pages, colored, ProgressDrawTarget::stderr())
    }

    /// Tracker that counts but never draws; used by the web server and tests.
    pub fn hidden(total_pages: usize) -> Self {
        Self::build(total_pages, false, ProgressDrawTarget::hidden())
    }

    fn build(total_pages: usize, colored: bool, target: ProgressDrawTarget) -> Self {
        let multi_progress = MultiProgress::with_draw_target(target);

        let main_bar = create_progress_bar(&multi_progress, total_pages as u64, colored);
        main_bar.set_message("Summarizing documents");
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            pages_loaded: total_pages,
            pages_summarized: Arc::new(AtomicUsize::new(0)),
            pages_failed: Arc::new(AtomicUsize::new(0)),
            chunks_created: Arc::new(AtomicUsize::new(0)),
            chars_processed: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_pages_summarized(&self, chars: u64) {
        self.pages_summarized.fetch_add(1, Ordering::SeqCst);
        self.chars_processed.fetch_add(chars, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_pages_failed(&self) {
        self.pages_failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn add_chunks(&self, count: usize) {
        self.chunks_created.fetch_add(count, Ordering::SeqCst);
        self.update_detail_bar();
    }

    pub fn set_message(&self, message: String) {
        self.detail_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Summarization complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> IndexingStats {
        IndexingStats {
            pages_loaded: self.pages_loaded,
            pages_summarized: self.pages_summarized.load(Ordering::SeqCst),
            pages_failed: self.pages_failed.load(Ordering::SeqCst),
            chunks_created: self.chunks_created.load(Ordering::SeqCst),
            total_chars_processed: self.chars_processed.load(Ordering::SeqCst),
            duration_ms: self.start_time.elapsed().as_millis() as u64,
        }
    }

    fn update_detail_bar(&self) {
        let chunks = self.chunks_created.load(Ordering::SeqCst);
        let failed = self.pages_failed.load(Ordering::SeqCst);

        self.detail_bar
            .set_message(format!("Chunks: {} | Failed: {}", chunks, failed));
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        if !self.main_bar.is_finished() {
            self.main_bar.abandon();
        }
        self.detail_bar.finish_and_clear();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let (template, chars) = if colored {
        (
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            "█▓▒░",
        )
    } else {
        (
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}",
            "=>-",
        )
    };

    let style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(chars);
    bar.set_style(style);
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexing_stats_calculations() {
        let stats = IndexingStats {
            pages_loaded: 10,
            pages_summarized: 9,
            pages_failed: 1,
            chunks_created: 40,
            total_chars_processed: 9000,
            duration_ms: 3000,
        };

        assert_eq!(stats.pages_per_second(), 3.0);
        assert_eq!(stats.chunks_per_page(), 4.0);
        assert_eq!(stats.success_rate(), 90.0);
    }

    #[test]
    fn test_indexing_stats_zero_duration() {
        let stats = IndexingStats::new();
        assert_eq!(stats.pages_per_second(), 0.0);
        assert_eq!(stats.chunks_per_page(), 0.0);
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn test_progress_tracker_counts() {
        let tracker = ProgressTracker::hidden(3);

        tracker.inc_pages_summarized(120);
        tracker.inc_pages_summarized(80);
        tracker.inc_pages_failed();
        tracker.add_chunks(7);

        let stats = tracker.get_stats();
        assert_eq!(stats.pages_loaded, 3);
        assert_eq!(stats.pages_summarized, 2);
        assert_eq!(stats.pages_failed, 1);
        assert_eq!(stats.chunks_created, 7);
        assert_eq!(stats.total_chars_processed, 200);
    }
}
