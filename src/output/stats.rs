//! Statistics generation from the article database
//!
//! This module provides functionality for extracting and displaying
//! archive statistics from the storage layer.

use crate::crawler::dates::{find_date, UNKNOWN_DATE};
use crate::output::OutputResult;
use crate::storage::Storage;
use std::collections::BTreeMap;

/// Archive statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveStatistics {
    /// Total number of stored articles
    pub total_articles: u64,

    /// Article count per publication year
    pub articles_by_year: BTreeMap<String, u64>,

    /// Articles stored with the `Unknown` date sentinel
    pub unknown_dates: u64,

    /// Articles whose date text carries no recognizable year
    pub unparsed_dates: u64,

    /// Last completed crawl, if any
    pub last_crawl_time: Option<String>,
}

/// Returns the four-digit year of a stored publish date
fn publish_year(publish_date: &str) -> Option<String> {
    find_date(publish_date).map(|date| date.chars().take(4).collect())
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(ArchiveStatistics)` - Successfully loaded statistics
/// * `Err(OutputError)` - Failed to query storage
pub fn load_statistics(storage: &dyn Storage) -> OutputResult<ArchiveStatistics> {
    let articles = storage.list_all()?;

    let mut stats = ArchiveStatistics {
        total_articles: storage.count()?,
        last_crawl_time: storage.last_crawl_time()?,
        ..Default::default()
    };

    for article in &articles {
        if article.publish_date == UNKNOWN_DATE {
            stats.unknown_dates += 1;
        } else if let Some(year) = publish_year(&article.publish_date) {
            *stats.articles_by_year.entry(year).or_insert(0) += 1;
        } else {
            stats.unparsed_dates += 1;
        }
    }

    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &ArchiveStatistics) {
    println!("=== Archive Statistics ===\n");

    println!("Overview:");
    println!("  Total articles: {}", stats.total_articles);
    match &stats.last_crawl_time {
        Some(time) => println!("  Last crawl: {}", time),
        None => println!("  Last crawl: never"),
    }
    println!();

    if !stats.articles_by_year.is_empty() {
        println!("Articles by Year:");
        // Newest year first
        for (year, count) in stats.articles_by_year.iter().rev() {
            let percentage = if stats.total_articles > 0 {
                (*count as f64 / stats.total_articles as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", year, count, percentage);
        }
        println!();
    }

    println!("Dates:");
    println!("  Unknown: {}", stats.unknown_dates);
    println!("  Unparsed: {}", stats.unparsed_dates);
}
