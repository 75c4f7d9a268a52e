//! Core types for raw results, ranked results and fetched documents.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;

/// A single result as returned by the upstream backend. Untrusted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title.
    pub title: String,
    /// Page URL, exactly as the backend returned it.
    pub url: String,
    /// Text snippet, when the engine supplied one.
    pub snippet: Option<String>,
    /// Identifier of the engine that produced the result.
    pub engine: Option<String>,
    /// Engine-specific relevance score. Only a weak signal.
    pub score: Option<f64>,
    /// Full-size image URL (image category only).
    pub image_url: Option<String>,
    /// Thumbnail URL (image category only).
    pub thumbnail_url: Option<String>,
}

/// A result after normalization, filtering and scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub title: String,
    /// Normalized URL; unique within one ranked set.
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Additive score, higher is better. No fixed range.
    pub score: f64,
    /// Lowercased hostname.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Set on slots that were selected for verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

/// SafeSearch level understood by SearXNG.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    Off,
    #[default]
    Moderate,
    Strict,
}

impl SafeSearch {
    /// Numeric level sent upstream (0, 1 or 2).
    pub fn level(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Moderate => 1,
            Self::Strict => 2,
        }
    }
}

impl FromStr for SafeSearch {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "moderate" => Ok(Self::Moderate),
            "strict" => Ok(Self::Strict),
            other => Err(SearchError::Config(format!(
                "unknown safesearch level: {other}"
            ))),
        }
    }
}

/// Requested content-fetch mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Plain HTTP GET with readability extraction.
    Http,
    /// Headless browser rendering.
    Rendered,
    /// HTTP first, escalating to rendering when extraction is weak.
    #[default]
    Auto,
}

/// Strategy that actually produced a [`FetchedDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    Http,
    Rendered,
}

impl FetchStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Rendered => "rendered",
        }
    }
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text content retrieved from a single URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedDocument {
    /// URL as requested.
    pub url: String,
    /// URL after redirects.
    pub final_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Plain text, never longer than the character budget.
    pub content_text: String,
    /// `true` iff the body or the text was cut.
    pub truncated: bool,
    /// Hex SHA-256 of `content_text`.
    pub content_sha256: String,
    /// ISO-8601 UTC retrieval time.
    pub retrieved_at: String,
    pub strategy: FetchStrategy,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn safesearch_levels() {
        assert_eq!(SafeSearch::Off.level(), 0);
        assert_eq!(SafeSearch::Moderate.level(), 1);
        assert_eq!(SafeSearch::Strict.level(), 2);
        assert_eq!(SafeSearch::default(), SafeSearch::Moderate);
    }

    #[test]
    fn safesearch_parses_case_insensitively() {
        assert_eq!("STRICT".parse::<SafeSearch>().expect("parse"), SafeSearch::Strict);
        assert!("medium".parse::<SafeSearch>().is_err());
    }

    #[test]
    fn fetch_mode_deserializes_lowercase() {
        let mode: FetchMode = serde_json::from_str("\"rendered\"").expect("deserialize");
        assert_eq!(mode, FetchMode::Rendered);
        assert_eq!(FetchMode::default(), FetchMode::Auto);
    }

    #[test]
    fn ranked_result_omits_empty_optionals() {
        let result = RankedResult {
            title: "Example".into(),
            url: "https://example.com/".into(),
            snippet: None,
            source: None,
            score: 1.0,
            domain: Some("example.com".into()),
            verified: None,
        };
        let json = serde_json::to_value(&result).expect("serialize");
        assert!(json.get("snippet").is_none());
        assert!(json.get("verified").is_none());
        assert_eq!(json["domain"], "example.com");
    }

    #[test]
    fn fetched_document_uses_camel_case_fields() {
        let doc = FetchedDocument {
            url: "https://example.com/".into(),
            final_url: "https://example.com/home".into(),
            title: None,
            content_text: "hi".into(),
            truncated: false,
            content_sha256: "00".into(),
            retrieved_at: "2024-01-01T00:00:00Z".into(),
            strategy: FetchStrategy::Http,
        };
        let json = serde_json::to_value(&doc).expect("serialize");
        assert_eq!(json["finalUrl"], "https://example.com/home");
        assert_eq!(json["contentText"], "hi");
        assert_eq!(json["strategy"], "http");
    }
}
