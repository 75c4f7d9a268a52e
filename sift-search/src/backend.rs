//! Trait definition for the upstream search backend.
//!
//! [`crate::engines::searxng::SearxngClient`] is the production
//! implementation; tests substitute in-memory backends.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::{SafeSearch, SearchResult};

/// One page request to the upstream backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub query: String,
    /// 1-based page number.
    pub page: u32,
    /// Language code sent upstream (e.g. `en`, `ja`).
    pub language: String,
    pub safesearch: SafeSearch,
    pub categories: Vec<String>,
    pub time_range: Option<String>,
    pub engines: Vec<String>,
}

impl SearchParams {
    /// First page of `query` with no category/engine restrictions.
    pub fn new(query: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            language: language.into(),
            safesearch: SafeSearch::default(),
            categories: Vec::new(),
            time_range: None,
            engines: Vec::new(),
        }
    }
}

/// A search backend returning raw, unranked results.
///
/// Implementations own their retry/timeout policy and must degrade a
/// malformed payload to an empty list instead of failing.
pub trait SearchBackend: Send + Sync {
    /// Fetch one page of raw results.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::UpstreamUnavailable`] once the retry budget
    /// is exhausted.
    fn search(
        &self,
        params: &SearchParams,
    ) -> impl std::future::Future<Output = Result<Vec<SearchResult>, SearchError>> + Send;
}
