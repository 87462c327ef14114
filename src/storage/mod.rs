//! Storage module for persisting harvested articles
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Article persistence with a uniqueness constraint on the link
//! - Crawl run bookkeeping (last successful crawl time)

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::HarvestError;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;
use std::path::Path;

/// Format of every timestamp the harvester stores
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset of the source site's local time (UTC+8)
pub const LOCAL_OFFSET_SECS: i32 = 8 * 3600;

/// Current time at the fixed UTC+8 offset
pub fn local_now() -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(LOCAL_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    Utc::now().with_timezone(&offset)
}

/// Formats a timestamp the way it is stored
pub fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(HarvestError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// An article as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    pub id: i64,
    pub title: String,
    pub link: String,
    pub content: String,
    pub publish_date: String,
    pub crawled_at: String,
}

/// An article ready to be inserted; the id is assigned by storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub title: String,
    pub link: String,
    pub content: String,
    pub publish_date: String,
    pub crawled_at: String,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: RunStatus,
    pub new_count: u64,
    pub stop_reason: Option<String>,
    pub error_message: Option<String>,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
