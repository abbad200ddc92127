// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: indexing progress reporting

mod progress;

pub use progress::{IndexingStats, ProgressTracker};
