//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the other crawler parts
//! together:
//! - Walking listing pages from the configured root
//! - Skipping candidates that are already stored
//! - Fetching, extracting and dating new articles
//! - Deciding when the run is over
//!
//! The loop is strictly sequential. One listing page, including every detail
//! page it links to, is finished before the next one is requested.

use crate::config::Config;
use crate::crawler::dates::resolve_date;
use crate::crawler::extractor::extract_content;
use crate::crawler::listing::{Candidate, ListingWalker};
use crate::crawler::{build_http_client, fetch_page};
use crate::state::{CrawlOutcome, CrawlState, StopReason};
use crate::storage::{format_timestamp, local_now, open_storage, NewArticle, Storage};
use crate::HarvestError;
use rand::Rng;
use reqwest::Client;
use scraper::Html;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// What a crawl invocation reports to its caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    /// `"success"`, or `"error"` when the run stopped on an internal error
    pub status: &'static str,

    /// What went wrong, for runs that stopped on an internal error
    #[serde(rename = "message", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Records inserted by this run
    pub new_count: u64,

    /// Records stored after this run
    pub total_count: u64,

    /// Persisted last crawl time, `YYYY-MM-DD HH:MM:SS` at UTC+8
    pub latest_crawl_time: Option<String>,

    /// Why the run ended
    pub stop_reason: StopReason,

    /// Listing pages fetched
    pub pages_visited: u32,
}

/// Main crawler coordinator structure
pub struct Coordinator<S: Storage> {
    config: Config,
    client: Client,
    storage: S,
    walker: ListingWalker,
    last_error: Option<String>,
}

impl<S: Storage> Coordinator<S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `storage` - Where articles are stored; held for the whole run
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn new(config: Config, storage: S) -> Result<Self, HarvestError> {
        let timeout = Duration::from_secs(config.crawler.request_timeout_secs);
        let client = build_http_client(&config.http, timeout)?;
        let walker = ListingWalker::new(&config.crawler.listing_root);

        Ok(Self {
            config,
            client,
            storage,
            walker,
            last_error: None,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Runs one crawl and returns how it ended
    ///
    /// Never fails: errors met mid-run end it with
    /// [`StopReason::InternalError`], and whatever was inserted before that
    /// stays stored and counted.
    pub async fn run(&mut self) -> CrawlOutcome {
        let mut state = CrawlState::new(&self.config.crawler.listing_root);
        self.last_error = None;

        tracing::info!(root = %state.current_url, "Starting crawl");

        let stop_reason = loop {
            match self.crawl_page(&mut state).await {
                Ok(None) => continue,
                Ok(Some(reason)) => break reason,
                Err(e) => {
                    tracing::error!(url = %state.current_url, "Crawl aborted: {}", e);
                    self.last_error = Some(e.to_string());
                    break StopReason::InternalError;
                }
            }
        };

        let outcome = state.finish(stop_reason);
        tracing::info!(
            new = outcome.new_count,
            pages = outcome.pages_visited,
            "Crawl finished: {}",
            outcome.stop_reason
        );
        outcome
    }

    /// Runs one crawl and records it in the runs table
    ///
    /// Setup failures (the run record cannot be created, the final counts
    /// cannot be read) are returned as errors. A run that stopped on an
    /// internal error is recorded as failed and reported with status
    /// `"error"`, its message and its partial count. It does not advance the
    /// last crawl time.
    pub async fn run_recorded(&mut self) -> Result<CrawlReport, HarvestError> {
        let run_id = self.storage.create_run()?;
        let outcome = self.run().await;

        let error_message = self.last_error.take();
        match &error_message {
            Some(message) => self.storage.fail_run(run_id, message)?,
            None => self.storage.finish_run(run_id, &outcome)?,
        }

        Ok(CrawlReport {
            status: if error_message.is_some() { "error" } else { "success" },
            error_message,
            new_count: outcome.new_count,
            total_count: self.storage.count()?,
            latest_crawl_time: self.storage.last_crawl_time()?,
            stop_reason: outcome.stop_reason,
            pages_visited: outcome.pages_visited,
        })
    }

    /// Processes the current listing page
    ///
    /// Returns `Some(reason)` when the run is over, `None` to go on with the
    /// next page (already stored in `state`).
    async fn crawl_page(
        &mut self,
        state: &mut CrawlState,
    ) -> Result<Option<StopReason>, HarvestError> {
        if state.page_limit_reached(self.config.crawler.max_pages) {
            tracing::info!(pages = state.page_count, "Page limit reached");
            return Ok(Some(StopReason::PageLimit));
        }

        let page = match fetch_page(&self.client, &state.current_url).await {
            Ok(page) => page,
            Err(failure) => {
                tracing::warn!("{}", failure);
                return Ok(Some(StopReason::FetchFailure));
            }
        };
        tracing::debug!(url = %page.url, bytes = page.body.len(), "Fetched listing page");
        state.begin_page();

        let base_url = Url::parse(&state.current_url)?;
        let (candidates, next_page) = {
            let document = Html::parse_document(&page.body);
            (
                self.walker.candidates(&document, &base_url),
                self.walker.next_page(&document, &base_url),
            )
        };

        tracing::info!(
            page = state.page_count,
            url = %state.current_url,
            "Listing page has {} candidates",
            candidates.len()
        );

        let threshold = self.config.crawler.max_consecutive_duplicates;
        for candidate in &candidates {
            if self.storage.exists(&candidate.url)? {
                tracing::debug!(url = %candidate.url, "Already stored");
                if state.record_duplicate(threshold) {
                    tracing::info!(
                        "{} stored articles in a row, crawl has caught up",
                        state.consecutive_duplicates
                    );
                    return Ok(Some(StopReason::DuplicateThreshold));
                }
                continue;
            }

            state.record_new_candidate();
            self.harvest(candidate, state).await?;
        }

        let Some(next_url) = next_page else {
            tracing::info!(url = %state.current_url, "No next page");
            return Ok(Some(StopReason::NoNextPage));
        };
        if next_url == state.current_url {
            tracing::warn!(url = %next_url, "Next page points back to the current page");
            return Ok(Some(StopReason::NoNextPage));
        }

        pause(
            self.config.crawler.page_delay_min_ms,
            self.config.crawler.page_delay_max_ms,
        )
        .await;
        state.advance_to(next_url);
        Ok(None)
    }

    /// Fetches, extracts and stores one new candidate
    ///
    /// A detail page that cannot be fetched or has no content region is
    /// skipped; only storage errors other than a duplicate link propagate.
    async fn harvest(
        &mut self,
        candidate: &Candidate,
        state: &mut CrawlState,
    ) -> Result<(), HarvestError> {
        let detail = match fetch_page(&self.client, &candidate.url).await {
            Ok(detail) => detail,
            Err(failure) => {
                tracing::warn!("Skipping article: {}", failure);
                return Ok(());
            }
        };

        let (extraction, publish_date) = {
            let document = Html::parse_document(&detail.body);
            let extraction = extract_content(&document);
            let publish_date = resolve_date(
                &document,
                &extraction.content,
                candidate.list_date.as_deref(),
            );
            (extraction, publish_date)
        };

        if extraction.is_usable() {
            let crawled_at = state.next_crawled_at(local_now());
            let article = NewArticle {
                title: candidate.title.clone(),
                link: candidate.url.clone(),
                content: extraction.content,
                publish_date,
                crawled_at: format_timestamp(&crawled_at),
            };

            match self.storage.insert(&article) {
                Ok(id) => {
                    state.record_insert();
                    tracing::info!(
                        id,
                        url = %article.link,
                        date = %article.publish_date,
                        "Stored: {}",
                        article.title
                    );
                }
                Err(e) if e.is_duplicate() => {
                    tracing::debug!(url = %article.link, "Inserted concurrently, ignoring");
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            tracing::warn!(url = %candidate.url, "No content region found, skipping");
        }

        pause(
            self.config.crawler.detail_delay_min_ms,
            self.config.crawler.detail_delay_max_ms,
        )
        .await;
        Ok(())
    }
}

/// Picks a pacing delay uniformly from `[min_ms, max_ms]`
///
/// Returns `None` for an all-zero range.
pub fn pick_delay(min_ms: u64, max_ms: u64) -> Option<Duration> {
    if max_ms == 0 {
        return None;
    }
    let millis = if min_ms >= max_ms {
        max_ms
    } else {
        rand::rng().random_range(min_ms..=max_ms)
    };
    Some(Duration::from_millis(millis))
}

async fn pause(min_ms: u64, max_ms: u64) {
    if let Some(delay) = pick_delay(min_ms, max_ms) {
        tokio::time::sleep(delay).await;
    }
}

/// Runs the main crawl operation
///
/// This function:
///
/// 1. Opens the article database
/// 2. Builds the HTTP client
/// 3. Records a new run
/// 4. Walks the listing from its root until a stop condition
/// 5. Marks the run finished and reports the counts
///
/// # Arguments
///
/// * `config` - The harvester configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran, possibly stopping early
/// * `Err(HarvestError)` - Storage or the HTTP client could not be set up
///
/// # Example
///
/// ```no_run
/// use bulletin_harvester::config::load_config;
/// use bulletin_harvester::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = run_crawl(&config).await?;
/// println!("{} new articles", report.new_count);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config) -> Result<CrawlReport, HarvestError> {
    let storage = open_storage(Path::new(&config.output.database_path))?;
    let mut coordinator = Coordinator::new(config.clone(), storage)?;
    coordinator.run_recorded().await
}
