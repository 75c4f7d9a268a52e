//! The gateway: composes upstream search, ranking, verification fetches,
//! caching and admission into the four tool operations.
//!
//! Each operation lives in its own module as an `impl` block on
//! [`Gateway`]:
//!
//! - [`search`]: ranked web search with optional verification
//! - [`images`]: image search
//! - [`research`]: multi-query research with optional document fetches
//! - [`fetch`]: single-URL fetch
//!
//! Caches and rate-limit windows are owned by the gateway instance, so two
//! gateways never share state.

pub mod fetch;
pub mod images;
pub mod research;
pub mod search;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sift_search::query::detect_language;
use sift_search::{
    ContentFetcher, NetworkAccessPolicy, Renderer, SearchBackend, SearchResult, SearxngClient,
    TargetGuard, TtlCache,
};
use tracing::debug;

use crate::config::{CacheSection, GatewayConfig};
use crate::error::Result;
use crate::rate_limit::RequestAdmission;

pub use types::{
    FetchArgs, FetchResponse, ImageResult, ImageSearchArgs, ImageSearchResponse, QueryResults,
    ResearchArgs, ResearchResponse, SearchArgs, SearchMode, SearchResponse,
};

/// Title and text kept from a verification fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedFetch {
    pub title: Option<String>,
    pub content_text: String,
}

/// Search aggregation gateway over a [`SearchBackend`].
pub struct Gateway<B = SearxngClient> {
    config: GatewayConfig,
    backend: B,
    guard: Arc<dyn TargetGuard>,
    fetcher: ContentFetcher,
    search_cache: TtlCache<SearchResponse>,
    image_cache: TtlCache<ImageSearchResponse>,
    fetch_cache: TtlCache<CachedFetch>,
    admission: RequestAdmission,
}

impl Gateway<SearxngClient> {
    /// Build a gateway talking to the configured SearXNG instance, guarded
    /// by the network access policy.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GatewayError::Config`] for invalid configuration and
    /// [`crate::GatewayError::Search`] if an HTTP client cannot be built.
    pub fn from_config(config: GatewayConfig) -> Result<Self> {
        config.validate()?;
        let backend = SearxngClient::new(&config.upstream)?;
        let guard = Arc::new(NetworkAccessPolicy::new(&config.policy));
        Self::with_parts(config, backend, guard)
    }
}

impl<B: SearchBackend> Gateway<B> {
    /// Build a gateway from explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GatewayError::Search`] if the fetch client cannot be
    /// built.
    pub fn with_parts(
        config: GatewayConfig,
        backend: B,
        guard: Arc<dyn TargetGuard>,
    ) -> Result<Self> {
        let fetcher = ContentFetcher::new(config.fetch.clone(), Arc::clone(&guard))?;
        let search_cache: TtlCache<SearchResponse> = build_cache(config.cache.search);
        let fetch_cache: TtlCache<CachedFetch> = build_cache(config.cache.fetch);
        debug!(
            search_cache = search_cache.is_enabled(),
            fetch_cache = fetch_cache.is_enabled(),
            "gateway ready"
        );
        Ok(Self {
            search_cache,
            image_cache: build_cache(config.cache.search),
            fetch_cache,
            admission: RequestAdmission::new(&config.rate_limit),
            config,
            backend,
            guard,
            fetcher,
        })
    }

    /// Replace the rendering backend used by rendered and `auto` fetches.
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.fetcher = self.fetcher.with_renderer(renderer);
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Rate-limit admission for one call from `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GatewayError::RateLimited`] when a window is exhausted.
    pub fn admit(&self, identity: &str) -> Result<()> {
        self.admission.admit(identity)
    }

    /// `auto` detects from `text`; absent uses the configured default.
    fn resolve_language(&self, requested: Option<&str>, text: &str) -> String {
        match requested.map(str::trim) {
            Some("auto") => detect_language(text).to_owned(),
            Some(lang) if !lang.is_empty() => lang.to_owned(),
            _ => self.config.search.default_language.clone(),
        }
    }
}

fn build_cache<V: Clone + Send + Sync + 'static>(section: CacheSection) -> TtlCache<V> {
    TtlCache::new(Duration::from_millis(section.ttl_ms), section.max_entries)
}

/// Raw results that carry both a title and a URL.
fn usable(raw: Vec<SearchResult>) -> Vec<SearchResult> {
    raw.into_iter()
        .filter(|r| !r.title.trim().is_empty() && !r.url.trim().is_empty())
        .collect()
}

/// Tech boost list when `enabled`, else empty.
fn tech_list(config: &GatewayConfig, enabled: bool) -> Vec<String> {
    if enabled {
        config.ranking.tech_domain_boost.clone()
    } else {
        Vec::new()
    }
}
