//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: counters and cursor of a single run (current page, duplicates in a row, inserts)
//! - `StopReason`: why a run ended
//! - `CrawlOutcome`: what a run reports back to its caller

mod crawl_state;
mod stop_reason;

// Re-export main types
pub use crawl_state::{CrawlOutcome, CrawlState};
pub use stop_reason::StopReason;
