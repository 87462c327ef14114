//! Listing page walker
//!
//! This module reads a listing page and finds:
//! - Article candidates (links that look like articles of this section)
//! - The date printed next to each candidate, when there is one
//! - The link to the next listing page
//!
//! The article filter is a heuristic meant to drop site navigation and footer
//! links. It is expected to be wrong occasionally in both directions.

use crate::crawler::dates::find_date;
use crate::crawler::selectors::{sole_text, stripped_text};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Article pages on the site all end in this file name
const ARTICLE_MARKER: &str = "index.html";

/// Anchor text must be longer than this (in characters) to be an article title
const MIN_TITLE_CHARS: usize = 5;

/// Label of the pagination link
const NEXT_PAGE_LABEL: &str = "下一页";

/// Pagination anchors whose whole text reads "next page"
static NEXT_PAGE_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)下一页|\bnext\b").expect("next page pattern is valid"));

/// A link on a listing page that looks like an article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute article URL
    pub url: String,

    /// Trimmed anchor text
    pub title: String,

    /// Date printed near the link on the listing page
    pub list_date: Option<String>,
}

/// Reads listing pages of one bulletin section
#[derive(Debug, Clone)]
pub struct ListingWalker {
    section_marker: String,
}

impl ListingWalker {
    /// Creates a walker for the section containing `listing_root`
    ///
    /// The section marker is the second-to-last path segment of the root
    /// URL; article links must contain it. It is taken from the serialized
    /// URL so that non-ASCII segments are percent-encoded the same way as
    /// resolved candidate links.
    pub fn new(listing_root: &str) -> Self {
        let serialized = Url::parse(listing_root)
            .map(String::from)
            .unwrap_or_else(|_| listing_root.to_string());
        let section_marker = serialized.rsplit('/').nth(1).unwrap_or("").to_string();
        Self { section_marker }
    }

    /// Path segment every article link must contain
    pub fn section_marker(&self) -> &str {
        &self.section_marker
    }

    /// Lists article candidates in document order
    ///
    /// # Arguments
    ///
    /// * `document` - The parsed listing page
    /// * `base_url` - URL of the listing page, for resolving relative links
    pub fn candidates(&self, document: &Html, base_url: &Url) -> Vec<Candidate> {
        let Ok(anchor_selector) = Selector::parse("a") else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for anchor in document.select(&anchor_selector) {
            let Some(href) = anchor.value().attr("href").filter(|h| !h.is_empty()) else {
                continue;
            };

            let url = match base_url.join(href) {
                Ok(url) => url.to_string(),
                Err(e) => {
                    tracing::debug!("Skipping unresolvable link {}: {}", href, e);
                    continue;
                }
            };

            let title = stripped_text(anchor, "");
            if !self.is_article(&url, &title) {
                continue;
            }

            candidates.push(Candidate {
                url,
                title,
                list_date: list_context_date(anchor),
            });
        }

        candidates
    }

    /// Returns true if a resolved link and its text look like an article
    pub fn is_article(&self, url: &str, title: &str) -> bool {
        url.contains(ARTICLE_MARKER)
            && title.chars().count() > MIN_TITLE_CHARS
            && url.contains(&self.section_marker)
    }

    /// Finds the URL of the next listing page
    ///
    /// Returns `None` when there is no pagination link, when it has no target,
    /// or when its target is `#` (the last page).
    pub fn next_page(&self, document: &Html, base_url: &Url) -> Option<String> {
        let anchor_selector = Selector::parse("a").ok()?;
        let anchors: Vec<ElementRef<'_>> = document.select(&anchor_selector).collect();

        let next = anchors
            .iter()
            .find(|anchor| {
                sole_text(**anchor).is_some_and(|text| NEXT_PAGE_TEXT.is_match(&text))
            })
            .or_else(|| {
                anchors
                    .iter()
                    .find(|anchor| anchor.text().collect::<String>().contains(NEXT_PAGE_LABEL))
            });

        let Some(next) = next else {
            tracing::debug!("No pagination link; last anchors on page:");
            for anchor in &anchors[anchors.len().saturating_sub(10)..] {
                tracing::debug!(
                    " - {}: {:?}",
                    stripped_text(*anchor, ""),
                    anchor.value().attr("href")
                );
            }
            return None;
        };

        // The site's pager sometimes keeps the target in `tagname` instead of `href`
        let href = next
            .value()
            .attr("href")
            .filter(|h| !h.is_empty())
            .or_else(|| next.value().attr("tagname"))?;
        tracing::debug!("Pagination link found, target: {}", href);

        if href.is_empty() || href == "#" {
            return None;
        }

        base_url.join(href).ok().map(|url| url.to_string())
    }
}

/// Looks for a date in the text around an anchor: parent first, then grandparent
fn list_context_date(anchor: ElementRef<'_>) -> Option<String> {
    let parent = anchor.parent().and_then(ElementRef::wrap)?;
    if let Some(date) = find_date(&stripped_text(parent, " ")) {
        return Some(date.to_string());
    }

    let grandparent = parent.parent().and_then(ElementRef::wrap)?;
    find_date(&stripped_text(grandparent, " ")).map(str::to_string)
}
