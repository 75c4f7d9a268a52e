//! SearXNG JSON API client with bounded retry.
//!
//! Queries `GET {base}/search?format=json`. A transport failure or non-2xx
//! status is retried up to `max_retries` times with linear backoff. A body
//! that is not the expected JSON object degrades to zero results.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{SearchBackend, SearchParams};
use crate::config::UpstreamConfig;
use crate::error::SearchError;
use crate::http;
use crate::types::SearchResult;

/// HTTP client for a SearXNG instance.
#[derive(Debug, Clone)]
pub struct SearxngClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
    backoff: Duration,
}

impl SearxngClient {
    /// Build a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &UpstreamConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: http::build_upstream_client(config)?,
            endpoint: format!("{}/search", config.base_url.trim_end_matches('/')),
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.backoff_ms),
        })
    }

    async fn attempt(&self, params: &SearchParams) -> Result<String, String> {
        let query = build_query(params);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| format!("response read failed: {e}"))
    }
}

impl SearchBackend for SearxngClient {
    async fn search(&self, params: &SearchParams) -> Result<Vec<SearchResult>, SearchError> {
        tracing::trace!(query = %params.query, page = params.page, "SearXNG search");

        let attempts = self.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 0..attempts {
            match self.attempt(params).await {
                Ok(body) => {
                    let results = parse_searxng_json(&body);
                    debug!(count = results.len(), attempt, "SearXNG response parsed");
                    return Ok(results);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "SearXNG attempt failed");
                    last_error = e;
                    if attempt + 1 < attempts {
                        tokio::time::sleep(self.backoff * (attempt + 1)).await;
                    }
                }
            }
        }

        Err(SearchError::UpstreamUnavailable {
            attempts,
            last_error,
        })
    }
}

fn build_query(params: &SearchParams) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("format", "json".to_owned()),
        ("q", params.query.clone()),
        ("pageno", params.page.to_string()),
        ("language", params.language.clone()),
        ("safesearch", params.safesearch.level().to_string()),
    ];
    if !params.categories.is_empty() {
        query.push(("categories", params.categories.join(",")));
    }
    if let Some(ref range) = params.time_range {
        query.push(("time_range", range.clone()));
    }
    if !params.engines.is_empty() {
        query.push(("engines", params.engines.join(",")));
    }
    query
}

/// Parse a SearXNG JSON body into raw results.
///
/// Anything other than an object with a `results` array yields an empty
/// list and a warning. Entries without a string `url` are skipped.
pub fn parse_searxng_json(body: &str) -> Vec<SearchResult> {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "SearXNG returned non-JSON body, treating as empty");
            return Vec::new();
        }
    };

    let Some(items) = value.get("results").and_then(Value::as_array) else {
        warn!("SearXNG payload has no results array, treating as empty");
        return Vec::new();
    };

    items.iter().filter_map(parse_item).collect()
}

fn parse_item(item: &Value) -> Option<SearchResult> {
    let text = |key: &str| {
        item.get(key)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .filter(|s| !s.is_empty())
    };

    let url = text("url")?;
    // Merged multi-engine items may carry only the `engines` list.
    let engine = text("engine").or_else(|| {
        item.get("engines")
            .and_then(Value::as_array)
            .and_then(|engines| engines.first())
            .and_then(Value::as_str)
            .map(str::to_owned)
            .filter(|s| !s.is_empty())
    });
    Some(SearchResult {
        title: text("title").unwrap_or_default(),
        url,
        snippet: text("content"),
        engine,
        score: item.get("score").and_then(Value::as_f64),
        image_url: text("img_src"),
        thumbnail_url: text("thumbnail_src"),
    })
}
