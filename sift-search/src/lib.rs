//! # sift-search
//!
//! Search aggregation and safe page fetching over a self-hosted SearXNG
//! instance.
//!
//! This crate holds the building blocks; the `sift` gateway composes them
//! into tool operations with caching and rate limiting.
//!
//! ## Design
//!
//! - [`SearxngClient`] queries the SearXNG JSON API with bounded retry
//! - [`rank`] normalises URLs, re-scores results and merges result sets
//! - [`NetworkAccessPolicy`] rejects fetch targets that resolve to private,
//!   loopback, link-local or metadata addresses
//! - [`ContentFetcher`] fetches pages over HTTP or through a headless
//!   browser, with every redirect hop re-validated
//! - [`pool::run_bounded`] fans work out with a concurrency cap
//! - [`TtlCache`] is an instance-owned TTL + LRU cache
//!
//! ## Security
//!
//! - Only `http`/`https` on ports 80 and 443 are fetched
//! - Response bodies are capped in bytes before decoding
//! - Search queries are logged only at debug level

pub mod backend;
pub mod cache;
pub mod config;
pub mod content;
pub mod engines;
pub mod error;
pub mod fetch;
pub mod http;
pub mod policy;
pub mod pool;
pub mod query;
pub mod rank;
pub mod types;

pub use backend::{SearchBackend, SearchParams};
pub use cache::TtlCache;
pub use config::{FetchConfig, PolicyConfig, RankingConfig, UpstreamConfig};
pub use engines::SearxngClient;
pub use error::{Result, SearchError};
pub use fetch::{ContentFetcher, Renderer};
pub use policy::{NetworkAccessPolicy, TargetGuard};
pub use query::Intent;
pub use types::{
    FetchMode, FetchStrategy, FetchedDocument, RankedResult, SafeSearch, SearchResult,
};

/// Canonical form of `url` used as its identity when deduplicating.
///
/// Fragments, default ports and tracking parameters are dropped and the
/// remaining query parameters are sorted.
///
/// # Examples
///
/// ```
/// let a = sift_search::canonical_url("https://example.com/a?utm_source=x&b=2&a=1#top");
/// let b = sift_search::canonical_url("https://example.com:443/a?a=1&b=2");
/// assert_eq!(a, b);
/// ```
pub fn canonical_url(url: &str) -> String {
    rank::url_normalize::normalize_url(url)
}
