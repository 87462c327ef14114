//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the harvester database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Harvested announcements, one row per link
CREATE TABLE IF NOT EXISTS announcements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    link TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL,
    publish_date TEXT NOT NULL,
    crawled_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_announcements_publish_date ON announcements(publish_date);

-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    status TEXT NOT NULL,
    new_count INTEGER NOT NULL DEFAULT 0,
    stop_reason TEXT,
    error_message TEXT
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
