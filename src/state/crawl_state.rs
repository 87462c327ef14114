use crate::state::StopReason;
use chrono::{DateTime, FixedOffset};

/// Mutable state of a single crawl run
///
/// One value is built per run and threaded through the coordinator loop, so
/// nothing leaks from one run into the next.
#[derive(Debug, Clone)]
pub struct CrawlState {
    /// Listing page being processed
    pub current_url: String,

    /// Number of listing pages fetched so far
    pub page_count: u32,

    /// Already-stored candidates seen in a row
    pub consecutive_duplicates: u32,

    /// Records inserted during this run
    pub new_record_count: u64,

    /// Last `crawled_at` stamp handed out in this run
    last_crawled_at: Option<DateTime<FixedOffset>>,
}

impl CrawlState {
    /// Creates the starting state for a run rooted at `listing_root`
    pub fn new(listing_root: &str) -> Self {
        Self {
            current_url: listing_root.to_string(),
            page_count: 0,
            consecutive_duplicates: 0,
            new_record_count: 0,
            last_crawled_at: None,
        }
    }

    /// Returns true once `max_pages` listing pages have been fetched
    pub fn page_limit_reached(&self, max_pages: u32) -> bool {
        self.page_count >= max_pages
    }

    /// Marks the current listing page as fetched
    pub fn begin_page(&mut self) {
        self.page_count += 1;
    }

    /// Records an already-stored candidate
    ///
    /// Returns true when the run should stop because `threshold` duplicates
    /// have now appeared in a row.
    pub fn record_duplicate(&mut self, threshold: u32) -> bool {
        self.consecutive_duplicates += 1;
        self.consecutive_duplicates >= threshold
    }

    /// Records a candidate that is not in storage yet
    pub fn record_new_candidate(&mut self) {
        self.consecutive_duplicates = 0;
    }

    /// Records a successful insert
    pub fn record_insert(&mut self) {
        self.new_record_count += 1;
    }

    /// Moves the crawl to the next listing page
    pub fn advance_to(&mut self, next_url: String) {
        self.current_url = next_url;
    }

    /// Returns the `crawled_at` stamp for the next insert
    ///
    /// Stamps never go backwards within a run, even if the wall clock does.
    pub fn next_crawled_at(&mut self, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let stamp = match self.last_crawled_at {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_crawled_at = Some(stamp);
        stamp
    }

    /// Finishes the run with the given stop reason
    pub fn finish(&self, stop_reason: StopReason) -> CrawlOutcome {
        CrawlOutcome {
            new_count: self.new_record_count,
            pages_visited: self.page_count,
            stop_reason,
        }
    }
}

/// Result of one crawl run (not persisted as such)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOutcome {
    /// Number of newly inserted records
    pub new_count: u64,

    /// Number of listing pages fetched
    pub pages_visited: u32,

    /// Why the run ended
    pub stop_reason: StopReason,
}
