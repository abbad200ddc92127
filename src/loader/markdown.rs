// file: src/loader/markdown.rs
// description: markdown sectioning with pulldown-cmark, one page per top-level section
// reference: https://docs.rs/pulldown-cmark

use crate::loader::normalizer::TextNormalizer;
use crate::models::Document;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownSection {
    pub title: Option<String>,
    pub text: String,
}

impl MarkdownSection {
    fn is_empty(&self) -> bool {
        self.title.is_none() && self.text.trim().is_empty()
    }

    pub fn page_content(&self) -> String {
        match &self.title {
            Some(title) if self.text.is_empty() => title.clone(),
            Some(title) => format!("{}\n\n{}", title, self.text),
            None => self.text.clone(),
        }
    }
}

pub struct MarkdownLoader {
    normalizer: TextNormalizer,
}

impl MarkdownLoader {
    pub fn new() -> Self {
        Self {
            normalizer: TextNormalizer::new(),
        }
    }

    pub fn to_pages(&self, source: &str, content: &str) -> Vec<Document> {
        self.sections(content)
            .iter()
            .enumerate()
            .map(|(idx, section)| Document::page(source, idx as u32, section.page_content()))
            .collect()
    }

    /// Splits on level 1 and 2 headings; deeper headings stay inline.
    pub fn sections(&self, content: &str) -> Vec<MarkdownSection> {
        let normalized = self.normalizer.normalize_markdown(content);
        let parser = Parser::new(&normalized);

        let mut sections = Vec::new();
        let mut current = MarkdownSection {
            title: None,
            text: String::new(),
        };
        let mut heading_text: Option<String> = None;
        let mut splits_section = false;

        for event in parser {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    splits_section = matches!(level, HeadingLevel::H1 | HeadingLevel::H2);
                    if splits_section && !current.is_empty() {
                        finish_section(&mut current);
                        sections.push(std::mem::replace(
                            &mut current,
                            MarkdownSection {
                                title: None,
                                text: String::new(),
                            },
                        ));
                    }
                    heading_text = Some(String::new());
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(text) = heading_text.take() {
                        let text = text.trim().to_string();
                        if splits_section {
                            current.title = Some(text);
                        } else {
                            current.text.push_str(&text);
                            current.text.push_str("\n\n");
                        }
                    }
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some(ref mut heading) = heading_text {
                        heading.push_str(&text);
                    } else {
                        current.text.push_str(&text);
                    }
                }
                Event::SoftBreak => {
                    if let Some(ref mut heading) = heading_text {
                        heading.push(' ');
                    } else {
                        current.text.push(' ');
                    }
                }
                Event::HardBreak => current.text.push('\n'),
                Event::End(TagEnd::Paragraph)
                | Event::End(TagEnd::CodeBlock)
                | Event::End(TagEnd::BlockQuote(_)) => current.text.push_str("\n\n"),
                Event::End(TagEnd::Item) => current.text.push('\n'),
                _ => {}
            }
        }

        if !current.is_empty() {
            finish_section(&mut current);
            sections.push(current);
        }

        sections
    }
}

fn finish_section(section: &mut MarkdownSection) {
    section.text = section.text.trim().to_string();
}

impl Default for MarkdownLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sections_split_on_top_headings() {
        let loader = MarkdownLoader::new();
        let content = "# Sorting\n\nQuicksort partitions.\n\n## Selection\n\nQuickSelect recurses once.\n\n### Analysis\n\nLinear on average.";

        let sections = loader.sections(content);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title.as_deref(), Some("Sorting"));
        assert_eq!(sections[0].text, "Quicksort partitions.");
        assert_eq!(sections[1].title.as_deref(), Some("Selection"));
        assert!(sections[1].text.contains("Analysis"));
        assert!(sections[1].text.contains("Linear on average."));
    }

    #[test]
    fn test_preamble_becomes_its_own_page() {
        let loader = MarkdownLoader::new();
        let pages = loader.to_pages("notes.md", "Intro text.\n\n# Heaps\n\nBinary heaps.");

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_content, "Intro text.");
        assert_eq!(pages[1].metadata.page, 1);
        assert_eq!(pages[1].page_content, "Heaps\n\nBinary heaps.");
    }

    #[test]
    fn test_code_blocks_are_kept() {
        let loader = MarkdownLoader::new();
        let sections = loader.sections("# Code\n\n```rust\nfn main() {}\n```\n");
        assert_eq!(sections.len(), 1);
        assert!(sections[0].text.contains("fn main() {}"));
    }
}
