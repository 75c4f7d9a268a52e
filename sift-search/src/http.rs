//! Shared HTTP client construction.
//!
//! The upstream client lets reqwest follow redirects (the SearXNG base URL
//! is operator-supplied and trusted). The fetch client never follows
//! redirects on its own: every hop is re-validated by the network policy.

use std::time::Duration;

use crate::config::{FetchConfig, UpstreamConfig};
use crate::error::SearchError;

/// Accept header sent with page fetches.
pub const FETCH_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,text/plain;q=0.8,*/*;q=0.7";

/// Build the [`reqwest::Client`] used to talk to SearXNG.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_upstream_client(config: &UpstreamConfig) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Build the [`reqwest::Client`] used for page fetches.
///
/// Redirects are disabled; the caller walks them manually.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_fetch_client(config: &FetchConfig) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_upstream_client_with_default_config() {
        assert!(build_upstream_client(&UpstreamConfig::default()).is_ok());
    }

    #[test]
    fn build_fetch_client_with_custom_ua() {
        let config = FetchConfig {
            user_agent: "CustomBot/1.0".into(),
            ..Default::default()
        };
        assert!(build_fetch_client(&config).is_ok());
    }

    #[test]
    fn accept_header_prefers_html() {
        assert!(FETCH_ACCEPT.starts_with("text/html"));
    }
}
