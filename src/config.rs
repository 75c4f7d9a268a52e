//! Gateway configuration.
//!
//! Loaded from TOML (`SIFT_CONFIG`, else `~/.config/sift/config.toml` when it
//! exists, else built-in defaults), then overridden from the environment,
//! then validated. Every section is `#[serde(default)]`, so a file only
//! needs the keys it changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sift_search::{FetchConfig, PolicyConfig, RankingConfig, SafeSearch, UpstreamConfig};

use crate::error::{GatewayError, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SIFT_CONFIG";

/// Complete gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub upstream: UpstreamConfig,
    pub search: SearchSettings,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub fetch: FetchConfig,
    pub policy: PolicyConfig,
    pub ranking: RankingConfig,
    pub host: HostConfig,
}

/// Defaults applied to search-style operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Language used when a call does not name one.
    pub default_language: String,
    pub default_safesearch: SafeSearch,
    /// Simultaneous verification / research document fetches.
    pub verify_concurrency: usize,
    /// Length of a snippet rebuilt from verified page text.
    pub snippet_chars: usize,
    /// Cap on merged research results.
    pub max_final_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_language: "ja".to_owned(),
            default_safesearch: SafeSearch::Moderate,
            verify_concurrency: 2,
            snippet_chars: 280,
            max_final_results: 20,
        }
    }
}

/// One TTL + LRU cache. `ttl_ms = 0` disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub ttl_ms: u64,
    pub max_entries: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_ms: 5 * 60_000,
            max_entries: 5_000,
        }
    }
}

/// Result and content caches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Web and image search responses.
    pub search: CacheSection,
    /// Verification fetches.
    pub fetch: CacheSection,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search: CacheSection::default(),
            fetch: CacheSection {
                ttl_ms: 12 * 60 * 60_000,
                max_entries: 20_000,
            },
        }
    }
}

/// Fixed-window admission limits per caller identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub per_minute: u32,
    pub per_day: u32,
    /// Windows tracked per limiter before expired ones are pruned.
    pub max_tracked_identities: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: 60,
            per_day: 2_000,
            max_tracked_identities: 50_000,
        }
    }
}

/// Host bridge tool naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Tools are exposed as `<prefix>_<name>`; empty means unprefixed.
    pub tool_prefix: String,
    /// Also accept the unprefixed names.
    pub legacy_tool_names: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tool_prefix: "sift".to_owned(),
            legacy_tool_names: false,
        }
    }
}

impl GatewayConfig {
    /// Load, apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Io`] for an unreadable file and
    /// [`GatewayError::Config`] for bad TOML, unparseable environment values
    /// or failed validation.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => {
                let path = Self::default_config_path();
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| GatewayError::Config(format!("{}: {e}", path.display())))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    #[cfg(test)]
    fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| GatewayError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/sift/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("sift").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("sift")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/sift-config/config.toml")
        }
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] naming the variable whose value
    /// does not parse.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_owned());

        if let Some(v) = var("SEARXNG_BASE_URL") {
            self.upstream.base_url = v;
        }
        if let Some(v) = var("SEARCH_DEFAULT_LANG") {
            self.search.default_language = v;
        }
        if let Some(v) = var("SEARCH_DEFAULT_SAFE") {
            self.search.default_safesearch = v
                .parse()
                .map_err(|_| invalid_env("SEARCH_DEFAULT_SAFE", &v))?;
        }
        if let Some(v) = var("SEARCH_CACHE_TTL_MS") {
            self.cache.search.ttl_ms = parse_env("SEARCH_CACHE_TTL_MS", &v)?;
        }
        if let Some(v) = var("RATE_LIMIT_PER_MINUTE") {
            self.rate_limit.per_minute = parse_env("RATE_LIMIT_PER_MINUTE", &v)?;
        }
        if let Some(v) = var("RATE_LIMIT_PER_DAY") {
            self.rate_limit.per_day = parse_env("RATE_LIMIT_PER_DAY", &v)?;
        }
        if let Some(v) = var("FETCH_TIMEOUT_MS") {
            self.fetch.timeout_ms = parse_env("FETCH_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = var("FETCH_MAX_BYTES") {
            self.fetch.max_bytes = parse_env("FETCH_MAX_BYTES", &v)?;
        }
        if let Some(v) = var("FETCH_MAX_CHARS") {
            self.fetch.max_chars = parse_env("FETCH_MAX_CHARS", &v)?;
        }
        if let Some(v) = var("RENDER_TIMEOUT_MS") {
            self.fetch.render_timeout_ms = parse_env("RENDER_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = var("ENABLE_RENDERED_FETCH") {
            self.fetch.enable_rendered = parse_flag(&v);
        }
        if let Some(v) = var("AGENT_BROWSER_BIN") {
            if !v.is_empty() {
                self.fetch.browser_bin = v;
            }
        }
        if let Some(v) = var("TECH_DOMAIN_BOOST") {
            let domains: Vec<String> = v
                .split(',')
                .map(|d| d.trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect();
            if !domains.is_empty() {
                self.ranking.tech_domain_boost = domains;
            }
        }
        if let Some(v) = var("TOOL_PREFIX") {
            self.host.tool_prefix = match v.to_ascii_lowercase().as_str() {
                "" => HostConfig::default().tool_prefix,
                "none" | "off" | "false" => String::new(),
                _ => v,
            };
        }
        if let Some(v) = var("ENABLE_LEGACY_TOOL_NAMES") {
            self.host.legacy_tool_names = parse_flag(&v);
        }
        Ok(())
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.upstream.validate().map_err(config_err)?;
        self.fetch.validate().map_err(config_err)?;
        self.policy.validate().map_err(config_err)?;
        self.ranking.validate().map_err(config_err)?;

        if self.search.default_language.trim().is_empty() {
            return Err(GatewayError::Config(
                "search.default_language must not be empty".into(),
            ));
        }
        if self.search.verify_concurrency == 0 {
            return Err(GatewayError::Config(
                "search.verify_concurrency must be at least 1".into(),
            ));
        }
        if self.search.snippet_chars == 0 || self.search.max_final_results == 0 {
            return Err(GatewayError::Config(
                "search.snippet_chars and search.max_final_results must be at least 1".into(),
            ));
        }
        if self.rate_limit.per_minute == 0 || self.rate_limit.per_day == 0 {
            return Err(GatewayError::Config(
                "rate_limit.per_minute and rate_limit.per_day must be at least 1".into(),
            ));
        }
        if self.rate_limit.max_tracked_identities == 0 {
            return Err(GatewayError::Config(
                "rate_limit.max_tracked_identities must be at least 1".into(),
            ));
        }
        let prefix = &self.host.tool_prefix;
        if !prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(GatewayError::Config(format!(
                "host.tool_prefix contains invalid characters: {prefix:?}"
            )));
        }
        Ok(())
    }
}

fn config_err(e: sift_search::SearchError) -> GatewayError {
    match e {
        sift_search::SearchError::Config(msg) => GatewayError::Config(msg),
        other => GatewayError::Config(other.to_string()),
    }
}

fn invalid_env(name: &str, value: &str) -> GatewayError {
    GatewayError::Config(format!("{name} has invalid value {value:?}"))
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| invalid_env(name, value))
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
