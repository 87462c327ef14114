//! Terminal outcomes of a crawl run

use serde::Serialize;
use std::fmt;

/// Why a crawl run ended
///
/// Every run ends with exactly one of these. Records inserted before the stop
/// stay committed and the run reports its count either way; only
/// `InternalError` marks the run as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The configured maximum number of listing pages was visited
    PageLimit,

    /// A listing page could not be fetched
    FetchFailure,

    /// Enough already-stored articles appeared in a row
    DuplicateThreshold,

    /// The listing page had no usable next-page link
    NoNextPage,

    /// Something unexpected went wrong mid-run (usually storage)
    InternalError,
}

impl StopReason {
    /// Converts the stop reason to its database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageLimit => "page_limit",
            Self::FetchFailure => "fetch_failure",
            Self::DuplicateThreshold => "duplicate_threshold",
            Self::NoNextPage => "no_next_page",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PageLimit => "page limit reached",
            Self::FetchFailure => "listing page fetch failed",
            Self::DuplicateThreshold => "caught up with stored articles",
            Self::NoNextPage => "no next page",
            Self::InternalError => "internal error",
        };
        write!(f, "{}", s)
    }
}
