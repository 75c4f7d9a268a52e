//! Error types for the sift gateway.

use sift_search::SearchError;

/// Top-level error type for gateway operations and the host bridge.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Search, ranking or fetch failure from the search layer.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// A pagination cursor could not be decoded.
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    /// Tool arguments failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The caller exhausted a rate-limit window.
    #[error("rate limited (per {scope}), window resets at {reset_at_ms}")]
    RateLimited {
        scope: &'static str,
        reset_at_ms: i64,
    },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Host protocol channel error.
    #[error("channel error: {0}")]
    Channel(String),
}

impl GatewayError {
    /// Stable machine-readable code reported to host callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Search(e) => match e {
                SearchError::UpstreamUnavailable { .. } => "upstream_unavailable",
                SearchError::ForbiddenTarget { .. } => "forbidden_target",
                SearchError::FeatureDisabled(_) => "feature_disabled",
                SearchError::RenderTimeout { .. } => "render_timeout",
                SearchError::FetchTimeout { .. } => "fetch_timeout",
                SearchError::InvalidUrl { .. } => "invalid_url",
                SearchError::Fetch { .. } | SearchError::Render { .. } => "fetch_failed",
                SearchError::Http(_) | SearchError::Parse(_) | SearchError::Config(_) => {
                    "internal"
                }
            },
            Self::InvalidCursor(_) => "invalid_cursor",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::RateLimited { .. } => "rate_limited",
            Self::Config(_) | Self::Io(_) | Self::Channel(_) => "internal",
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, GatewayError>;
