//! Selector strategies and text helpers
//!
//! The source pages carry no semantic markup, so every lookup is a guess at a
//! known shape. Each guess is a named CSS selector; a chain of them is tried in
//! order and the first element found wins.

use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose text never reaches the reader
const HIDDEN_TAGS: &[&str] = &["script", "style"];

/// One named way of locating an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorStrategy {
    /// Name used in logs
    pub name: &'static str,

    /// CSS selector tried against the whole document
    pub selector: &'static str,
}

impl SelectorStrategy {
    pub const fn new(name: &'static str, selector: &'static str) -> Self {
        Self { name, selector }
    }

    /// Returns the first element matching this strategy
    pub fn find<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        match Selector::parse(self.selector) {
            Ok(selector) => document.select(&selector).next(),
            Err(e) => {
                tracing::warn!("Invalid selector for strategy {}: {:?}", self.name, e);
                None
            }
        }
    }
}

/// Tries each strategy in order and returns the first hit with its name
pub fn first_match<'a>(
    document: &'a Html,
    strategies: &[SelectorStrategy],
) -> Option<(&'static str, ElementRef<'a>)> {
    strategies.iter().find_map(|strategy| {
        strategy.find(document).map(|element| {
            tracing::debug!("Selector strategy '{}' matched", strategy.name);
            (strategy.name, element)
        })
    })
}

/// Joins every descendant text node, each trimmed, skipping empty ones
///
/// This is the text a reader sees with layout whitespace removed.
pub fn stripped_text(element: ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Returns true for elements whose subtree is not visible text
pub fn is_hidden(element: ElementRef<'_>) -> bool {
    HIDDEN_TAGS.contains(&element.value().name())
}

/// Like [`stripped_text`], but skips `script` and `style` subtrees
pub fn visible_text(element: ElementRef<'_>, separator: &str) -> String {
    let mut parts = Vec::new();
    collect_visible(element, &mut parts);
    parts.join(separator)
}

fn collect_visible<'a>(element: ElementRef<'a>, parts: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed);
                }
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    if !is_hidden(child) {
                        collect_visible(child, parts);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Returns the text of an element whose only content is a single string
///
/// Descends through elements that wrap exactly one child, so
/// `<a><span>next</span></a>` yields `next`. Elements with mixed or
/// multiple children yield `None`.
pub fn sole_text(element: ElementRef<'_>) -> Option<String> {
    let mut children = element.children();
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }

    match only.value() {
        Node::Text(text) => {
            let text: &str = text;
            Some(text.to_string())
        }
        Node::Element(_) => ElementRef::wrap(only).and_then(sole_text),
        _ => None,
    }
}
