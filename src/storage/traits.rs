//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::CrawlOutcome;
use crate::storage::{ArticleRecord, NewArticle, RunRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// The link is already stored; callers treat this as a no-op
    #[error("Duplicate link: {0}")]
    DuplicateKey(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StorageError {
    /// Returns true if this error only reports an already-stored link
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateKey(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The crawler only needs a record store keyed by article link plus a small
/// amount of run bookkeeping. A single crawling task owns the backend for the
/// duration of a run, so implementations need no internal locking.
pub trait Storage {
    // ===== Articles =====

    /// Returns true if an article with this link is already stored
    fn exists(&self, link: &str) -> StorageResult<bool>;

    /// Inserts a new article
    ///
    /// # Returns
    ///
    /// The id assigned to the article, or `StorageError::DuplicateKey` if the
    /// link is already present. The check and the write are a single
    /// conditional insert.
    fn insert(&mut self, article: &NewArticle) -> StorageResult<i64>;

    /// Counts stored articles
    fn count(&self) -> StorageResult<u64>;

    /// Lists every article, newest publish date first, then newest id first
    fn list_all(&self) -> StorageResult<Vec<ArticleRecord>>;

    /// Most recent `crawled_at` among stored articles
    fn latest_crawled_at(&self) -> StorageResult<Option<String>>;

    // ===== Run Management =====

    /// Records the start of a crawl run and returns its id
    fn create_run(&mut self) -> StorageResult<i64>;

    /// Marks a run as completed with its outcome
    ///
    /// This also updates the persisted last-crawl time.
    fn finish_run(&mut self, run_id: i64, outcome: &CrawlOutcome) -> StorageResult<()>;

    /// Marks a run as failed
    fn fail_run(&mut self, run_id: i64, message: &str) -> StorageResult<()>;

    /// Gets a run by id
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Finish time of the most recent completed run
    fn last_crawl_time(&self) -> StorageResult<Option<String>>;
}
