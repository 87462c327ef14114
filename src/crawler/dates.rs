//! Publication date resolution
//!
//! A detail page rarely marks its date semantically, so the date comes from
//! the first source that yields one:
//!
//! 1. the date printed next to the link on the listing page
//! 2. the page's time marker element (taken verbatim)
//! 3. the low-emphasis info cell, searched for a date
//! 4. the last five lines of the body (usually the signature), bottom-up
//! 5. `"Unknown"`

use crate::crawler::selectors::{stripped_text, SelectorStrategy};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

/// Stored when no date could be found
pub const UNKNOWN_DATE: &str = "Unknown";

/// How many trailing body lines are searched for a signature date
const SIGNATURE_LINES: usize = 5;

/// `YYYY-M-D` or `YYYY年M月D日`, day suffix optional
pub static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}[-年]\d{1,2}[-月]\d{1,2}[日]?").expect("date pattern is valid")
});

/// Element whose text is the publication date as printed
pub const TIME_MARKER: SelectorStrategy = SelectorStrategy::new("time-marker", "span#shijian");

/// Header cell that usually carries source and date
pub const INFO_CELL: SelectorStrategy = SelectorStrategy::new("info-cell", "td.hui12");

/// Returns the first date-looking substring of `text`
pub fn find_date(text: &str) -> Option<&str> {
    DATE_PATTERN.find(text).map(|m| m.as_str())
}

/// Resolves the publication date of a detail page
///
/// # Arguments
///
/// * `document` - The parsed detail page
/// * `content` - Body text already produced by the extractor
/// * `list_date` - Date found next to the link on the listing page, if any
///
/// # Returns
///
/// A date string in the site's own format, or [`UNKNOWN_DATE`]
pub fn resolve_date(document: &Html, content: &str, list_date: Option<&str>) -> String {
    if let Some(date) = list_date {
        return date.to_string();
    }

    if let Some(date) = time_marker_date(document) {
        tracing::debug!("Date from time marker: {}", date);
        return date;
    }

    if let Some(date) = info_cell_date(document) {
        tracing::debug!("Date from info cell: {}", date);
        return date;
    }

    if let Some(date) = signature_date(content) {
        tracing::debug!("Date from body signature: {}", date);
        return date.to_string();
    }

    UNKNOWN_DATE.to_string()
}

fn time_marker_date(document: &Html) -> Option<String> {
    let marker = TIME_MARKER.find(document)?;
    let text = stripped_text(marker, "");
    // An empty marker says nothing; let the later sources speak
    (!text.is_empty()).then_some(text)
}

fn info_cell_date(document: &Html) -> Option<String> {
    let cell = INFO_CELL.find(document)?;
    let text: String = cell.text().collect();
    find_date(&text).map(str::to_string)
}

/// Searches the last few body lines, bottom-up, for a date
pub fn signature_date(content: &str) -> Option<&str> {
    if content.is_empty() {
        return None;
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let start = lines.len().saturating_sub(SIGNATURE_LINES);
    lines[start..].iter().rev().copied().find_map(find_date)
}
