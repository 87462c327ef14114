//! Crawler module for listing traversal and article harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a fixed request identity
//! - Selector strategies and text helpers for unstructured markup
//! - Article body extraction and table linearization
//! - Publication date resolution
//! - Listing page traversal
//! - Overall crawl coordination

mod coordinator;
pub mod dates;
pub mod extractor;
mod fetcher;
pub mod listing;
pub mod selectors;
pub mod table;

pub use coordinator::{pick_delay, run_crawl, Coordinator, CrawlReport};
pub use dates::{find_date, resolve_date, DATE_PATTERN, UNKNOWN_DATE};
pub use extractor::{extract_content, extract_content_from_html, Extraction};
pub use fetcher::{build_http_client, fetch_page, FetchFailure, FetchFailureReason, FetchedPage};
pub use listing::{Candidate, ListingWalker};
pub use selectors::{first_match, stripped_text, SelectorStrategy};
pub use table::{render_table, table_rows, visual_width};
