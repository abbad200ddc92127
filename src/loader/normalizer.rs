// file: src/loader/normalizer.rs
// description: text cleanup for extracted pages and markdown normalization
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HYPHENATED_BREAK: Regex =
        Regex::new(r"(\w)-\n(\w)").expect("HYPHENATED_BREAK regex is valid");

    static ref BLANK_RUNS: Regex = Regex::new(r"\n{3,}").expect("BLANK_RUNS regex is valid");

    static ref INLINE_SPACES: Regex = Regex::new(r"[ \t]{2,}").expect("INLINE_SPACES regex is valid");
}

pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Cleans text coming out of a PDF or a plain text file.
    pub fn clean_extracted(&self, text: &str) -> String {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n");
        let trimmed_lines = unified
            .lines()
            .map(|line| INLINE_SPACES.replace_all(line.trim(), " ").into_owned())
            .collect::<Vec<_>>()
            .join("\n");
        let joined = HYPHENATED_BREAK.replace_all(&trimmed_lines, "$1$2");

        BLANK_RUNS.replace_all(&joined, "\n\n").trim().to_string()
    }

    pub fn normalize_markdown(&self, content: &str) -> String {
        let mut normalized = content.replace("\r\n", "\n");

        normalized = self.normalize_headings(&normalized);
        normalized = self.normalize_lists(&normalized);
        normalized = self.normalize_line_breaks(&normalized);

        normalized
    }

    fn normalize_headings(&self, content: &str) -> String {
        let mut in_code_block = false;

        content
            .lines()
            .map(|line| {
                let trimmed = line.trim();
                if trimmed.starts_with("```") {
                    in_code_block = !in_code_block;
                }

                if in_code_block || !trimmed.starts_with('#') {
                    return line.to_string();
                }

                let level = trimmed.chars().take_while(|&c| c == '#').count();
                let text = trimmed.trim_start_matches('#').trim();

                if !text.is_empty() && level <= 6 {
                    format!("{} {}", "#".repeat(level), text)
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn normalize_lists(&self, content: &str) -> String {
        content
            .lines()
            .map(|line| {
                let trimmed = line.trim_start();

                match trimmed
                    .strip_prefix("* ")
                    .or_else(|| trimmed.strip_prefix("+ "))
                {
                    Some(stripped) => {
                        let indent = line.len() - trimmed.len();
                        format!("{}- {}", " ".repeat(indent), stripped.trim())
                    }
                    None => line.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn normalize_line_breaks(&self, content: &str) -> String {
        let trimmed = content
            .lines()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join("\n");

        BLANK_RUNS.replace_all(&trimmed, "\n\n").into_owned()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
