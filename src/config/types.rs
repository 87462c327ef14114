use serde::Deserialize;

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Builds a configuration with every default applied for the given listing root
    pub fn default_for(listing_root: &str) -> Self {
        Self {
            crawler: CrawlerConfig::new(listing_root),
            http: HttpConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// First listing page of the bulletin section
    #[serde(rename = "listing-root")]
    pub listing_root: String,

    /// Maximum number of listing pages visited in one run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Already-stored candidates in a row that end the run
    #[serde(
        rename = "max-consecutive-duplicates",
        default = "default_max_consecutive_duplicates"
    )]
    pub max_consecutive_duplicates: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Pause after each detail page fetch (milliseconds, lower bound)
    #[serde(rename = "detail-delay-min-ms", default = "default_detail_delay_min_ms")]
    pub detail_delay_min_ms: u64,

    /// Pause after each detail page fetch (milliseconds, upper bound)
    #[serde(rename = "detail-delay-max-ms", default = "default_detail_delay_max_ms")]
    pub detail_delay_max_ms: u64,

    /// Pause before moving to the next listing page (milliseconds, lower bound)
    #[serde(rename = "page-delay-min-ms", default = "default_page_delay_min_ms")]
    pub page_delay_min_ms: u64,

    /// Pause before moving to the next listing page (milliseconds, upper bound)
    #[serde(rename = "page-delay-max-ms", default = "default_page_delay_max_ms")]
    pub page_delay_max_ms: u64,
}

impl CrawlerConfig {
    pub fn new(listing_root: &str) -> Self {
        Self {
            listing_root: listing_root.to_string(),
            max_pages: default_max_pages(),
            max_consecutive_duplicates: default_max_consecutive_duplicates(),
            request_timeout_secs: default_request_timeout_secs(),
            detail_delay_min_ms: default_detail_delay_min_ms(),
            detail_delay_max_ms: default_detail_delay_max_ms(),
            page_delay_min_ms: default_page_delay_min_ms(),
            page_delay_max_ms: default_page_delay_max_ms(),
        }
    }

    /// Disables both pacing delays
    pub fn without_delays(mut self) -> Self {
        self.detail_delay_min_ms = 0;
        self.detail_delay_max_ms = 0;
        self.page_delay_min_ms = 0;
        self.page_delay_max_ms = 0;
        self
    }
}

/// Request identity sent with every fetch
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept")]
    pub accept: String,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept: default_accept(),
            accept_language: default_accept_language(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Path to the markdown listing file
    #[serde(rename = "summary-path", default = "default_summary_path")]
    pub summary_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            summary_path: default_summary_path(),
        }
    }
}

fn default_max_pages() -> u32 {
    10
}

fn default_max_consecutive_duplicates() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_detail_delay_min_ms() -> u64 {
    500
}

fn default_detail_delay_max_ms() -> u64 {
    1500
}

fn default_page_delay_min_ms() -> u64 {
    1000
}

fn default_page_delay_max_ms() -> u64 {
    2000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8".to_string()
}

fn default_accept_language() -> String {
    "zh-CN,zh;q=0.9,en;q=0.8".to_string()
}

fn default_database_path() -> String {
    "data.db".to_string()
}

fn default_summary_path() -> String {
    "announcements.md".to_string()
}
