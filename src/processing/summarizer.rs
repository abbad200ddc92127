// file: src/processing/summarizer.rs
// description: page summarization via map-reduce LLM prompts or extractive fallback
// reference: map each piece, collapse partial summaries, combine once

use crate::error::Result;
use crate::llm::{BackoffPolicy, ChatModel, retry_with_exponential_backoff};
use crate::models::Document;
use crate::processing::splitter::RecursiveCharacterTextSplitter;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

pub const SUMMARY_PROMPT: &str =
    "Write a concise summary of the following:\n\n\n\"{text}\"\n\n\nCONCISE SUMMARY:";

/// Rough characters-per-token ratio used for prompt budgeting.
const CHARS_PER_TOKEN: usize = 4;
const MAX_COLLAPSE_ROUNDS: usize = 4;

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, document: &Document) -> Result<String>;
}

pub fn summary_prompt(text: &str) -> String {
    SUMMARY_PROMPT.replace("{text}", text)
}

fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

pub struct MapReduceSummarizer {
    chat: Arc<dyn ChatModel>,
    token_max: usize,
    retry: BackoffPolicy,
}

impl MapReduceSummarizer {
    pub fn new(chat: Arc<dyn ChatModel>, token_max: usize, retry: BackoffPolicy) -> Self {
        Self {
            chat,
            token_max: token_max.max(1),
            retry,
        }
    }

    async fn run_chain(&self, document: &Document) -> Result<String> {
        let pieces = self.split_for_budget(&document.page_content)?;

        let prompts: Vec<String> = pieces.iter().map(|piece| summary_prompt(piece)).collect();
        let mapped = join_all(prompts.iter().map(|prompt| self.chat.complete(prompt)))
            .await
            .into_iter()
            .collect::<Result<Vec<String>>>()?;

        debug!(
            "Mapped page {} into {} partial summaries",
            document.metadata.page,
            mapped.len()
        );

        let collapsed = self.collapse(mapped).await?;
        self.chat
            .complete(&summary_prompt(&collapsed.join("\n\n")))
            .await
    }

    fn split_for_budget(&self, text: &str) -> Result<Vec<String>> {
        if estimate_tokens(text) <= self.token_max {
            return Ok(vec![text.to_string()]);
        }

        let splitter = RecursiveCharacterTextSplitter::new(self.token_max * CHARS_PER_TOKEN, 0)?;
        Ok(splitter.split_text(text))
    }

    /// Combines partial summaries in groups until they fit one prompt.
    async fn collapse(&self, mut summaries: Vec<String>) -> Result<Vec<String>> {
        for _ in 0..MAX_COLLAPSE_ROUNDS {
            let total: usize = summaries.iter().map(|s| estimate_tokens(s)).sum();
            if total <= self.token_max || summaries.len() <= 1 {
                return Ok(summaries);
            }

            let groups = self.group_by_budget(&summaries);
            if groups.len() == summaries.len() {
                break;
            }

            let prompts: Vec<String> = groups
                .iter()
                .map(|group| summary_prompt(&group.join("\n\n")))
                .collect();
            summaries = join_all(prompts.iter().map(|prompt| self.chat.complete(prompt)))
                .await
                .into_iter()
                .collect::<Result<Vec<String>>>()?;
        }

        warn!(
            "Partial summaries still exceed {} tokens, combining anyway",
            self.token_max
        );
        Ok(summaries)
    }

    fn group_by_budget(&self, summaries: &[String]) -> Vec<Vec<String>> {
        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_tokens = 0;

        for summary in summaries {
            let tokens = estimate_tokens(summary);
            if !current.is_empty() && current_tokens + tokens > self.token_max {
                groups.push(std::mem::take(&mut current));
                current_tokens = 0;
            }
            current.push(summary.clone());
            current_tokens += tokens;
        }

        if !current.is_empty() {
            groups.push(current);
        }

        groups
    }
}

#[async_trait]
impl Summarizer for MapReduceSummarizer {
    async fn summarize(&self, document: &Document) -> Result<String> {
        retry_with_exponential_backoff(&self.retry, || self.run_chain(document)).await
    }
}

/// Offline summarizer: leading sentences up to a character budget.
#[derive(Debug, Clone)]
pub struct ExtractiveSummarizer {
    max_chars: usize,
}

impl ExtractiveSummarizer {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    pub fn summarize_text(&self, text: &str) -> String {
        let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut summary = String::new();

        for sentence in split_sentences(&flattened) {
            let needed = sentence.chars().count() + usize::from(!summary.is_empty());
            if summary.chars().count() + needed > self.max_chars {
                break;
            }
            if !summary.is_empty() {
                summary.push(' ');
            }
            summary.push_str(sentence);
        }

        if summary.is_empty() {
            flattened.chars().take(self.max_chars).collect()
        } else {
            summary
        }
    }
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self::new(400)
    }
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().is_none_or(|(_, next)| next.is_whitespace());
            if at_boundary {
                let end = idx + c.len_utf8();
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = end;
            }
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }

    sentences
}

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    async fn summarize(&self, document: &Document) -> Result<String> {
        Ok(self.summarize_text(&document.page_content))
    }
}
