//! Output module for presenting harvested articles
//!
//! This module handles:
//! - Loading the article list view from storage
//! - Rendering the list as a markdown document
//! - Archive statistics

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_listing, write_markdown_listing};
pub use stats::{load_statistics, print_statistics, ArchiveStatistics};

use crate::storage::{ArticleRecord, Storage, StorageError};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Everything the single list view shows
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArticleView {
    /// Articles, newest publish date first
    pub articles: Vec<ArticleRecord>,

    /// When the archive was last refreshed, if known
    pub latest_crawl_time: Option<String>,
}

/// Loads the list view from storage
///
/// Never fails. A storage read failure shows up as an empty list, and the
/// last crawl time falls back to the newest `crawled_at` among stored
/// articles when no completed run is recorded.
pub fn load_article_view(storage: &dyn Storage) -> ArticleView {
    let articles = storage.list_all().unwrap_or_else(|e| {
        tracing::warn!("Failed to load articles: {}", e);
        Vec::new()
    });

    let recorded = storage.last_crawl_time().unwrap_or_else(|e| {
        tracing::warn!("Failed to load last crawl time: {}", e);
        None
    });
    let latest_crawl_time = recorded.or_else(|| storage.latest_crawled_at().ok().flatten());

    ArticleView {
        articles,
        latest_crawl_time,
    }
}
