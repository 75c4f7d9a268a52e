//! Argument and response shapes for the four gateway operations.
//!
//! Field names follow the tool wire format callers already use, which mixes
//! `snake_case` (search) and `camelCase` (research, fetch).

use serde::{Deserialize, Serialize};
use sift_search::query::Intent;
use sift_search::{FetchMode, FetchedDocument, RankedResult, SafeSearch};

use crate::error::{GatewayError, Result};

pub const MAX_SEARCH_LIMIT: u32 = 50;
pub const MIN_FETCH_CHARS: usize = 100;
pub const MAX_FETCH_CHARS: usize = 100_000;

/// How much verification a web search does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// No verification.
    #[default]
    Fast,
    /// Verify the top result over plain HTTP.
    Balanced,
    /// Verify the top three, escalating to rendering when needed.
    High,
}

impl SearchMode {
    pub fn verify_top_k(self) -> usize {
        match self {
            Self::Fast => 0,
            Self::Balanced => 1,
            Self::High => 3,
        }
    }

    pub fn verify_fetch_mode(self) -> FetchMode {
        match self {
            Self::High => FetchMode::Auto,
            Self::Fast | Self::Balanced => FetchMode::Http,
        }
    }
}

fn default_limit() -> u32 {
    10
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::InvalidArgument(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

fn require_range<T>(field: &str, value: T, min: T, max: T) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(GatewayError::InvalidArgument(format!(
            "{field} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

/// `web_search` arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub cursor: Option<String>,
    /// Language code, or `auto` to detect from the query.
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub safe: Option<SafeSearch>,
    #[serde(default)]
    pub mode: SearchMode,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub time_range: Option<String>,
    #[serde(default)]
    pub engines: Option<Vec<String>>,
    /// Defaults to on for technical and hardware queries.
    #[serde(default)]
    pub tech_bias: Option<bool>,
    #[serde(default)]
    pub include_domains: Option<Vec<String>>,
    #[serde(default)]
    pub exclude_domains: Option<Vec<String>>,
}

impl SearchArgs {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: default_limit(),
            cursor: None,
            lang: None,
            safe: None,
            mode: SearchMode::default(),
            categories: None,
            time_range: None,
            engines: None,
            tech_bias: None,
            include_domains: None,
            exclude_domains: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_text("query", &self.query)?;
        require_range("limit", self.limit, 1, MAX_SEARCH_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub intent: Intent,
    pub language: String,
    pub results: Vec<RankedResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl SearchResponse {
    pub fn render_text(&self) -> String {
        numbered(self.results.iter().map(|r| (r.title.as_str(), r.url.as_str())))
    }
}

/// `web_image_search` arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSearchArgs {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub safe: Option<SafeSearch>,
    #[serde(default)]
    pub engines: Option<Vec<String>>,
}

impl ImageSearchArgs {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: default_limit(),
            cursor: None,
            lang: None,
            safe: None,
            engines: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_text("query", &self.query)?;
        require_range("limit", self.limit, 1, MAX_SEARCH_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub title: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Normalized URL of the page the image appears on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_page_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSearchResponse {
    pub results: Vec<ImageResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl ImageSearchResponse {
    pub fn render_text(&self) -> String {
        numbered(
            self.results
                .iter()
                .map(|r| (r.title.as_str(), r.image_url.as_str())),
        )
    }
}

fn default_max_queries() -> usize {
    3
}

fn default_per_query_limit() -> usize {
    5
}

fn default_research_fetch_mode() -> FetchMode {
    FetchMode::Http
}

/// `web_research` arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchArgs {
    pub question: String,
    #[serde(default = "default_max_queries")]
    pub max_queries: usize,
    #[serde(default = "default_per_query_limit")]
    pub per_query_limit: usize,
    #[serde(default)]
    pub fetch_top_k: usize,
    #[serde(default = "default_research_fetch_mode")]
    pub fetch_mode: FetchMode,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub safe: Option<SafeSearch>,
}

impl ResearchArgs {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            max_queries: default_max_queries(),
            per_query_limit: default_per_query_limit(),
            fetch_top_k: 0,
            fetch_mode: default_research_fetch_mode(),
            lang: None,
            safe: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_text("question", &self.question)?;
        require_range("maxQueries", self.max_queries, 1, 5)?;
        require_range("perQueryLimit", self.per_query_limit, 1, 10)?;
        require_range("fetchTopK", self.fetch_top_k, 0, 3)
    }
}

/// Ranked results for one expanded query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResults {
    pub query: String,
    pub results: Vec<RankedResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResponse {
    pub queries: Vec<QueryResults>,
    pub final_results: Vec<RankedResult>,
    pub documents: Vec<FetchResponse>,
}

impl ResearchResponse {
    pub fn render_text(&self) -> String {
        numbered(
            self.final_results
                .iter()
                .map(|r| (r.title.as_str(), r.url.as_str())),
        )
    }
}

/// `web_fetch` arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchArgs {
    pub url: String,
    #[serde(default)]
    pub mode: FetchMode,
    #[serde(default)]
    pub max_chars: Option<usize>,
}

impl FetchArgs {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mode: FetchMode::default(),
            max_chars: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_text("url", &self.url)?;
        if let Some(max) = self.max_chars {
            require_range("maxChars", max, MIN_FETCH_CHARS, MAX_FETCH_CHARS)?;
        }
        Ok(())
    }
}

/// A fetched document plus the mode the caller asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(flatten)]
    pub document: FetchedDocument,
    pub mode: FetchMode,
}

impl FetchResponse {
    pub fn render_text(&self) -> String {
        let doc = &self.document;
        match doc.title.as_deref() {
            Some(title) => format!("{title}\n{}\n\n{}", doc.final_url, doc.content_text),
            None => format!("{}\n\n{}", doc.final_url, doc.content_text),
        }
    }
}

fn numbered<'a>(items: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    items
        .enumerate()
        .map(|(i, (title, url))| format!("{}. {title}\n{url}", i + 1))
        .collect::<Vec<_>>()
        .join("\n\n")
}
