//! Error types for the sift-search crate.
//!
//! Messages are stable and safe to surface to callers. Target URLs appear
//! in fetch/policy errors so a caller can decide whether to skip the item;
//! query text never does.

/// Errors that can occur while searching, ranking or fetching.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The upstream search backend failed on every attempt.
    #[error("upstream search unavailable after {attempts} attempt(s): {last_error}")]
    UpstreamUnavailable { attempts: u32, last_error: String },

    /// The target was rejected by the network access policy.
    #[error("forbidden target {url}: {reason}")]
    ForbiddenTarget { url: String, reason: String },

    /// A capability was requested that configuration has turned off.
    #[error("feature disabled: {0}")]
    FeatureDisabled(String),

    /// The headless browser did not finish within its budget.
    #[error("render timed out after {timeout_ms}ms: {url}")]
    RenderTimeout { url: String, timeout_ms: u64 },

    /// The HTTP fetch did not finish within its budget.
    #[error("fetch timed out after {timeout_ms}ms: {url}")]
    FetchTimeout { url: String, timeout_ms: u64 },

    /// The HTTP fetch failed (transport error or non-success status).
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The headless browser reported a failure.
    #[error("render failed for {url}: {reason}")]
    Render { url: String, reason: String },

    /// The input could not be parsed as a URL.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// An HTTP client could not be built or used.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A payload could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    /// Builds a [`SearchError::ForbiddenTarget`].
    pub fn forbidden(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ForbiddenTarget {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors raised by the network access policy.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::ForbiddenTarget { .. })
    }
}

/// Convenience type alias for sift-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
