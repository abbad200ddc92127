// file: src/processing/mod.rs
// description: splitting, summarization and document processing
// reference: internal module structure

pub mod processor;
pub mod splitter;
pub mod summarizer;

pub use processor::{DocumentProcessor, ProcessedDocument};
pub use splitter::RecursiveCharacterTextSplitter;
pub use summarizer::{ExtractiveSummarizer, MapReduceSummarizer, Summarizer};
