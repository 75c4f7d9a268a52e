//! Configuration for the upstream client, fetcher, network policy and ranker.
//!
//! Every struct deserializes with `#[serde(default)]` so a partial TOML
//! section only overrides what it names. Call `validate()` before use.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Upstream SearXNG connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the SearXNG instance.
    pub base_url: String,
    /// Per-attempt timeout.
    pub timeout_ms: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Linear backoff unit: the wait before retry `n` is `backoff_ms * n`.
    pub backoff_ms: u64,
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_owned(),
            timeout_ms: 8_000,
            max_retries: 1,
            backoff_ms: 200,
            user_agent: "sift/0.1".to_owned(),
        }
    }
}

impl UpstreamConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| SearchError::Config(format!("upstream.base_url is invalid: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SearchError::Config(
                "upstream.base_url must be http or https".into(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(SearchError::Config(
                "upstream.timeout_ms must be greater than 0".into(),
            ));
        }
        if self.max_retries > 5 {
            return Err(SearchError::Config(
                "upstream.max_retries must be <= 5".into(),
            ));
        }
        Ok(())
    }
}

/// Content fetch settings for both strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Overall budget for one HTTP fetch, redirects included.
    pub timeout_ms: u64,
    /// Body bytes read before the rest is discarded.
    pub max_bytes: usize,
    /// Default character budget for extracted text.
    pub max_chars: usize,
    pub max_redirects: usize,
    /// Budget for the navigation and read steps of a render.
    pub render_timeout_ms: u64,
    /// Budget for best-effort setup steps (viewport, asset blocking).
    pub render_setup_timeout_ms: u64,
    pub enable_rendered: bool,
    /// Headless browser driver executable.
    pub browser_bin: String,
    /// `auto` escalates when extracted text is shorter than this.
    pub weak_extraction_chars: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 12_000,
            max_bytes: 2_000_000,
            max_chars: 12_000,
            max_redirects: 10,
            render_timeout_ms: 20_000,
            render_setup_timeout_ms: 5_000,
            enable_rendered: false,
            browser_bin: "agent-browser".to_owned(),
            weak_extraction_chars: 400,
            user_agent: "sift/0.1".to_owned(),
        }
    }
}

impl FetchConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.timeout_ms < 1_000 {
            return Err(SearchError::Config("fetch.timeout_ms must be >= 1000".into()));
        }
        if self.max_bytes < 10_000 {
            return Err(SearchError::Config("fetch.max_bytes must be >= 10000".into()));
        }
        if self.max_chars < 100 {
            return Err(SearchError::Config("fetch.max_chars must be >= 100".into()));
        }
        if self.render_timeout_ms < 1_000 {
            return Err(SearchError::Config(
                "fetch.render_timeout_ms must be >= 1000".into(),
            ));
        }
        if self.enable_rendered && self.browser_bin.trim().is_empty() {
            return Err(SearchError::Config(
                "fetch.browser_bin must be set when rendering is enabled".into(),
            ));
        }
        Ok(())
    }
}

/// Network access policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub dns_cache_entries: u64,
    /// Resolved addresses are re-validated after this long.
    pub dns_cache_ttl_secs: u64,
    pub dns_timeout_ms: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            dns_cache_entries: 10_000,
            dns_cache_ttl_secs: 600,
            dns_timeout_ms: 5_000,
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.dns_timeout_ms == 0 {
            return Err(SearchError::Config(
                "policy.dns_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Tunable heuristics for the relevance ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Domains boosted when tech bias is on.
    pub tech_domain_boost: Vec<String>,
    /// Raw engine scores are divided by this.
    pub raw_score_divisor: f64,
    pub title_token_weight: f64,
    pub snippet_token_weight: f64,
    pub tech_domain_weight: f64,
    pub intent_domain_weight: f64,
    /// Hostnames starting with `docs.` or containing `developer.`.
    pub docs_host_weight: f64,
    /// URLs containing `/docs` or `/documentation`.
    pub docs_path_weight: f64,
    /// Additive penalties per domain (negative values).
    pub domain_penalties: Vec<DomainPenalty>,
}

/// A fixed additive score adjustment for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainPenalty {
    pub domain: String,
    pub weight: f64,
}

/// Default list of documentation and developer hosts.
pub const DEFAULT_TECH_DOMAINS: &[&str] = &[
    "developer.mozilla.org",
    "docs.microsoft.com",
    "learn.microsoft.com",
    "docs.oracle.com",
    "cloudflare.com",
    "kubernetes.io",
    "nodejs.org",
    "python.org",
    "pypi.org",
    "npmjs.com",
    "github.com",
    "gitlab.com",
    "stackoverflow.com",
];

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            tech_domain_boost: DEFAULT_TECH_DOMAINS.iter().map(|d| (*d).to_owned()).collect(),
            raw_score_divisor: 10.0,
            title_token_weight: 3.0,
            snippet_token_weight: 1.0,
            tech_domain_weight: 5.0,
            intent_domain_weight: 4.0,
            docs_host_weight: 2.0,
            docs_path_weight: 1.0,
            domain_penalties: vec![
                DomainPenalty {
                    domain: "pinterest.com".into(),
                    weight: -10.0,
                },
                DomainPenalty {
                    domain: "quora.com".into(),
                    weight: -6.0,
                },
            ],
        }
    }
}

impl RankingConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if !(self.raw_score_divisor.is_finite() && self.raw_score_divisor > 0.0) {
            return Err(SearchError::Config(
                "ranking.raw_score_divisor must be a positive number".into(),
            ));
        }
        let weights = [
            self.title_token_weight,
            self.snippet_token_weight,
            self.tech_domain_weight,
            self.intent_domain_weight,
            self.docs_host_weight,
            self.docs_path_weight,
        ];
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(SearchError::Config("ranking weights must be finite".into()));
        }
        if self.domain_penalties.iter().any(|p| p.domain.trim().is_empty()) {
            return Err(SearchError::Config(
                "ranking.domain_penalties entries need a domain".into(),
            ));
        }
        Ok(())
    }
}
