//! Detail page content extraction
//!
//! Finds the article body on a detail page and flattens it to plain text:
//! one line per text run, trimmed, with tables replaced in place by aligned
//! text blocks and script/style content dropped.

use crate::crawler::selectors::{first_match, is_hidden, SelectorStrategy};
use crate::crawler::table::linearize_table;
use scraper::{ElementRef, Html, Node};

/// Where the article body lives, most specific first
pub const CONTENT_REGIONS: &[SelectorStrategy] = &[
    SelectorStrategy::new("zoom", "div#zoom"),
    SelectorStrategy::new("content", "div.content"),
];

/// Result of extracting a detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Normalized body text; empty when no region was found
    pub content: String,

    /// Name of the strategy that located the body
    pub region: Option<&'static str>,
}

impl Extraction {
    /// Returns true if a content region was located
    pub fn found(&self) -> bool {
        self.region.is_some()
    }

    /// Returns true if this article can be stored
    pub fn is_usable(&self) -> bool {
        self.found() && !self.content.is_empty()
    }
}

/// Extracts the article body from a parsed detail page
pub fn extract_content(document: &Html) -> Extraction {
    match first_match(document, CONTENT_REGIONS) {
        Some((region, element)) => Extraction {
            content: linearize(element),
            region: Some(region),
        },
        None => Extraction {
            content: String::new(),
            region: None,
        },
    }
}

/// Parses `html` and extracts its article body
pub fn extract_content_from_html(html: &str) -> Extraction {
    extract_content(&Html::parse_document(html))
}

/// Flattens a content region to newline-separated text
pub fn linearize(region: ElementRef<'_>) -> String {
    let mut lines = Vec::new();
    collect_lines(region, &mut lines);
    lines.join("\n")
}

fn collect_lines(element: ElementRef<'_>, lines: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    lines.push(trimmed.to_string());
                }
            }
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_hidden(child) {
                    continue;
                }
                if child.value().name() == "table" {
                    // The rendered block keeps its inner line breaks; only the
                    // outer newlines go, like any other trimmed text run.
                    let block = linearize_table(child);
                    let trimmed = block.trim();
                    if !trimmed.is_empty() {
                        lines.push(trimmed.to_string());
                    }
                } else {
                    collect_lines(child, lines);
                }
            }
            _ => {}
        }
    }
}
