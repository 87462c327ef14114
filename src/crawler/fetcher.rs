//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the browser-like request identity
//! - GET requests for listing and detail pages
//! - Forced UTF-8 decoding of response bodies
//! - Failure classification
//!
//! There is no retry here. A failed fetch is reported once and the caller
//! decides what to give up on.

use crate::config::HttpConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested
    pub url: String,

    /// Page body decoded as UTF-8
    pub body: String,
}

/// Why a fetch produced no document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailureReason {
    /// The server answered with something other than 200
    Status(u16),

    /// The request did not complete in time
    Timeout,

    /// Connection, TLS, or body read error
    Transport(String),
}

/// A failed fetch; logged by the caller, never fatal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub url: String,
    pub reason: FetchFailureReason,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            FetchFailureReason::Status(code) => {
                write!(f, "failed to fetch {}: status {}", self.url, code)
            }
            FetchFailureReason::Timeout => write!(f, "failed to fetch {}: timed out", self.url),
            FetchFailureReason::Transport(error) => {
                write!(f, "failed to fetch {}: {}", self.url, error)
            }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The request identity (User-Agent, Accept, Accept-Language)
/// * `timeout` - Overall per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use bulletin_harvester::config::HttpConfig;
/// use bulletin_harvester::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&HttpConfig::default(), Duration::from_secs(15)).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    if let Ok(accept) = HeaderValue::from_str(&config.accept) {
        headers.insert(ACCEPT, accept);
    }
    if let Ok(language) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, language);
    }
    if let Ok(agent) = HeaderValue::from_str(&config.user_agent) {
        headers.insert(USER_AGENT, agent);
    }

    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns its body as UTF-8 text
///
/// The body is always decoded as UTF-8, whatever charset the server declares;
/// invalid sequences are replaced rather than failing the page. Only HTTP 200
/// counts as success.
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, FetchFailure> {
    let failure = |reason| FetchFailure {
        url: url.to_string(),
        reason,
    };

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            failure(FetchFailureReason::Timeout)
        } else {
            failure(FetchFailureReason::Transport(e.to_string()))
        }
    })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(failure(FetchFailureReason::Status(status.as_u16())));
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            failure(FetchFailureReason::Timeout)
        } else {
            failure(FetchFailureReason::Transport(e.to_string()))
        }
    })?;

    Ok(FetchedPage {
        url: url.to_string(),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}
