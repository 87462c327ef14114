//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::CrawlOutcome;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    format_timestamp, local_now, ArticleRecord, NewArticle, RunRecord, RunStatus,
};
use crate::HarvestError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn article_from_row(row: &Row<'_>) -> rusqlite::Result<ArticleRecord> {
    Ok(ArticleRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        link: row.get(2)?,
        content: row.get(3)?,
        publish_date: row.get(4)?,
        crawled_at: row.get(5)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Articles =====

    fn exists(&self, link: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM announcements WHERE link = ?1",
                params![link],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert(&mut self, article: &NewArticle) -> StorageResult<i64> {
        if article.content.is_empty() {
            return Err(StorageError::Database(format!(
                "refusing to store empty content for {}",
                article.link
            )));
        }

        let changed = self.conn.execute(
            "INSERT INTO announcements (title, link, content, publish_date, crawled_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(link) DO NOTHING",
            params![
                article.title,
                article.link,
                article.content,
                article.publish_date,
                article.crawled_at
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::DuplicateKey(article.link.clone()));
        }

        Ok(self.conn.last_insert_rowid())
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM announcements", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn list_all(&self) -> StorageResult<Vec<ArticleRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, link, content, publish_date, crawled_at
             FROM announcements ORDER BY publish_date DESC, id DESC",
        )?;

        let articles = stmt
            .query_map([], article_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(articles)
    }

    fn latest_crawled_at(&self) -> StorageResult<Option<String>> {
        let latest: Option<String> = self
            .conn
            .query_row("SELECT MAX(crawled_at) FROM announcements", [], |row| {
                row.get(0)
            })?;
        Ok(latest)
    }

    // ===== Run Management =====

    fn create_run(&mut self) -> StorageResult<i64> {
        let now = format_timestamp(&local_now());
        self.conn.execute(
            "INSERT INTO runs (started_at, status) VALUES (?1, ?2)",
            params![now, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(&mut self, run_id: i64, outcome: &CrawlOutcome) -> StorageResult<()> {
        let now = format_timestamp(&local_now());
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, new_count = ?3, stop_reason = ?4
             WHERE id = ?5",
            params![
                RunStatus::Completed.to_db_string(),
                now,
                outcome.new_count as i64,
                outcome.stop_reason.as_str(),
                run_id
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn fail_run(&mut self, run_id: i64, message: &str) -> StorageResult<()> {
        let now = format_timestamp(&local_now());
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, error_message = ?3 WHERE id = ?4",
            params![RunStatus::Failed.to_db_string(), now, message, run_id],
        )?;
        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, status, new_count, stop_reason, error_message
             FROM runs WHERE id = ?1",
        )?;

        let run = stmt
            .query_row(params![run_id], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    status: RunStatus::from_db_string(&row.get::<_, String>(3)?)
                        .unwrap_or(RunStatus::Running),
                    new_count: row.get::<_, i64>(4)? as u64,
                    stop_reason: row.get(5)?,
                    error_message: row.get(6)?,
                })
            })
            .optional()?;

        run.ok_or(StorageError::RunNotFound(run_id))
    }

    fn last_crawl_time(&self) -> StorageResult<Option<String>> {
        let finished: Option<String> = self
            .conn
            .query_row(
                "SELECT finished_at FROM runs WHERE status = ?1 ORDER BY id DESC LIMIT 1",
                params![RunStatus::Completed.to_db_string()],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        Ok(finished)
    }
}
