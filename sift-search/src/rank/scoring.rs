//! Lexical and domain-trust scoring for raw search results.
//!
//! Raw engine scores are not comparable across the engines SearXNG
//! aggregates, so they only contribute `raw / divisor`. Query-token hits in
//! the title/snippet and the domain boosts dominate the ranking.
//!
//! ```text
//! score = raw / divisor
//!       + title_weight   per query token found in the title
//!       + snippet_weight per query token found only in the snippet
//!       + tech_weight    if the domain is on the tech boost list
//!       + intent_weight  if the domain is on the intent boost list
//!       + docs_host      if the host starts with "docs." or contains "developer."
//!       + docs_path      if the path contains "/docs" or "/documentation"
//!       + penalty        per matching low-signal domain
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::config::RankingConfig;
use crate::types::{RankedResult, SearchResult};

use super::url_normalize::{domain_matches, host_of, matches_any, normalize_url};

/// Inputs for one [`rerank`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankRequest<'a> {
    pub query: &'a str,
    /// Boosted when tech bias is on; pass an empty slice otherwise.
    pub tech_domains: &'a [String],
    /// Intent-specific boost list.
    pub intent_domains: &'a [String],
    /// When set and non-empty, only matching domains are kept.
    pub include_domains: Option<&'a [String]>,
    /// Matching domains are dropped.
    pub exclude_domains: Option<&'a [String]>,
}

/// Score, deduplicate, filter and sort `results` for `request.query`.
///
/// Deduplication is per call: the first occurrence of a normalized URL
/// wins. The output is sorted non-increasing by score; equal scores keep
/// input order.
pub fn rerank(
    request: &RankRequest<'_>,
    results: &[SearchResult],
    weights: &RankingConfig,
) -> Vec<RankedResult> {
    let query_tokens = tokenize(request.query);
    let include = request.include_domains.filter(|d| !d.is_empty());

    let mut seen: HashSet<String> = HashSet::new();
    let mut scored = Vec::with_capacity(results.len());

    for item in results {
        let normalized = normalize_url(&item.url);
        if !seen.insert(normalized.clone()) {
            continue;
        }

        let domain = host_of(&item.url);
        if let Some(ref host) = domain {
            if request.exclude_domains.is_some_and(|d| matches_any(host, d)) {
                continue;
            }
            if include.is_some_and(|d| !matches_any(host, d)) {
                continue;
            }
        }

        let score = score_result(request, &query_tokens, item, domain.as_deref(), weights);

        scored.push(RankedResult {
            title: item.title.clone(),
            url: normalized,
            snippet: item.snippet.clone(),
            source: item.engine.clone(),
            score,
            domain,
            verified: None,
        });
    }

    sort_by_score(&mut scored);
    scored
}

/// Stable sort, highest score first.
pub fn sort_by_score(results: &mut [RankedResult]) {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

fn score_result(
    request: &RankRequest<'_>,
    query_tokens: &HashSet<String>,
    item: &SearchResult,
    domain: Option<&str>,
    weights: &RankingConfig,
) -> f64 {
    let mut score = item.score.unwrap_or(0.0) / weights.raw_score_divisor;

    let title_tokens = tokenize(&item.title);
    let snippet_tokens = tokenize(item.snippet.as_deref().unwrap_or_default());
    for token in query_tokens {
        if title_tokens.contains(token) {
            score += weights.title_token_weight;
        } else if snippet_tokens.contains(token) {
            score += weights.snippet_token_weight;
        }
    }

    if let Some(host) = domain {
        if matches_any(host, request.tech_domains) {
            score += weights.tech_domain_weight;
        }
        if matches_any(host, request.intent_domains) {
            score += weights.intent_domain_weight;
        }
        if host.starts_with("docs.") || host.contains("developer.") {
            score += weights.docs_host_weight;
        }
        for penalty in &weights.domain_penalties {
            if domain_matches(host, &penalty.domain) {
                score += penalty.weight;
            }
        }
    }

    let path = url::Url::parse(item.url.trim())
        .map(|u| u.path().to_owned())
        .unwrap_or_else(|_| item.url.clone());
    if path.contains("/docs") || path.contains("/documentation") {
        score += weights.docs_path_weight;
    }

    score
}

/// Lowercase tokens of ASCII alphanumerics, kana or CJK ideographs,
/// at least two characters long.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !is_token_char(c))
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_owned)
        .collect()
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_lowercase()
        || c.is_ascii_digit()
        || matches!(c, '\u{3040}'..='\u{30ff}' | '\u{3400}'..='\u{9fff}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, url: &str, snippet: Option<&str>, score: Option<f64>) -> SearchResult {
        SearchResult {
            title: title.into(),
            url: url.into(),
            snippet: snippet.map(Into::into),
            engine: Some("duckduckgo".into()),
            score,
            ..Default::default()
        }
    }

    fn request<'a>(query: &'a str, tech: &'a [String]) -> RankRequest<'a> {
        RankRequest {
            query,
            tech_domains: tech,
            ..Default::default()
        }
    }

    #[test]
    fn tokenize_splits_on_punctuation_and_drops_short_tokens() {
        let tokens = tokenize("Fetch-API: a Guide (v2)");
        assert!(tokens.contains("fetch"));
        assert!(tokens.contains("api"));
        assert!(tokens.contains("guide"));
        assert!(tokens.contains("v2"));
        assert!(!tokens.contains("a"));
    }

    #[test]
    fn tokenize_keeps_cjk_runs() {
        let tokens = tokenize("東京 タワー の歴史");
        assert!(tokens.contains("東京"));
        assert!(tokens.contains("タワー"));
        assert!(tokens.contains("の歴史"));
    }

    #[test]
    fn title_hit_outweighs_snippet_hit() {
        let results = vec![
            raw("Unrelated", "https://a.example/", Some("all about rust"), None),
            raw("Rust book", "https://b.example/", None, None),
        ];
        let ranked = rerank(&request("rust", &[]), &results, &RankingConfig::default());
        assert_eq!(ranked[0].url, "https://b.example/");
        assert!((ranked[0].score - 3.0).abs() < f64::EPSILON);
        assert!((ranked[1].score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn raw_score_is_a_weak_prior() {
        let results = vec![raw("x", "https://a.example/", None, Some(25.0))];
        let ranked = rerank(&request("zzz", &[]), &results, &RankingConfig::default());
        assert!((ranked[0].score - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn domain_boosts_are_additive() {
        let tech = vec!["developer.mozilla.org".to_owned()];
        let results = vec![raw(
            "x",
            "https://developer.mozilla.org/en-US/docs/Web/API",
            None,
            None,
        )];
        let ranked = rerank(&request("zzz", &tech), &results, &RankingConfig::default());
        // tech 5 + developer host 2 + docs path 1
        assert!((ranked[0].score - 8.0).abs() < f64::EPSILON);
        assert_eq!(ranked[0].domain.as_deref(), Some("developer.mozilla.org"));
    }

    #[test]
    fn intent_boost_applies_to_subdomains() {
        let intent = vec!["wikipedia.org".to_owned()];
        let req = RankRequest {
            query: "zzz",
            intent_domains: &intent,
            ..Default::default()
        };
        let results = vec![raw("x", "https://en.wikipedia.org/wiki/X", None, None)];
        let ranked = rerank(&req, &results, &RankingConfig::default());
        assert!((ranked[0].score - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn low_signal_domains_are_penalised() {
        let results = vec![
            raw("rust", "https://www.pinterest.com/pin/1", None, None),
            raw("rust", "https://www.quora.com/q", None, None),
            raw("rust", "https://example.com/", None, None),
        ];
        let ranked = rerank(&request("rust", &[]), &results, &RankingConfig::default());
        assert_eq!(ranked[0].domain.as_deref(), Some("example.com"));
        assert!((ranked[1].score - -3.0).abs() < f64::EPSILON);
        assert!((ranked[2].score - -7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn first_occurrence_of_duplicate_wins() {
        let results = vec![
            raw("first", "https://example.com/search?q=fetch&utm_source=dup", None, Some(10.0)),
            raw("second", "https://example.com/search?utm_source=dup2&q=fetch", None, Some(90.0)),
        ];
        let ranked = rerank(&request("fetch", &[]), &results, &RankingConfig::default());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].title, "first");
        assert_eq!(ranked[0].url, "https://example.com/search?q=fetch");
    }

    #[test]
    fn exclude_and_include_filters() {
        let results = vec![
            raw("a", "https://docs.rs/tokio", None, None),
            raw("b", "https://github.com/tokio-rs/tokio", None, None),
            raw("c", "https://blog.example.com/", None, None),
        ];
        let exclude = vec!["example.com".to_owned()];
        let req = RankRequest {
            query: "tokio",
            exclude_domains: Some(&exclude),
            ..Default::default()
        };
        let ranked = rerank(&req, &results, &RankingConfig::default());
        assert_eq!(ranked.len(), 2);

        let include = vec!["github.com".to_owned()];
        let req = RankRequest {
            query: "tokio",
            include_domains: Some(&include),
            ..Default::default()
        };
        let ranked = rerank(&req, &results, &RankingConfig::default());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].domain.as_deref(), Some("github.com"));
    }

    #[test]
    fn empty_include_list_does_not_filter() {
        let results = vec![raw("a", "https://a.example/", None, None)];
        let include: Vec<String> = Vec::new();
        let req = RankRequest {
            query: "a",
            include_domains: Some(&include),
            ..Default::default()
        };
        assert_eq!(rerank(&req, &results, &RankingConfig::default()).len(), 1);
    }

    #[test]
    fn output_is_sorted_and_unique() {
        let results = vec![
            raw("alpha", "https://a.example/1", None, Some(1.0)),
            raw("beta gamma", "https://b.example/2", None, Some(3.0)),
            raw("alpha", "https://a.example/1#frag", None, Some(9.0)),
            raw("gamma", "https://c.example/3", Some("beta"), None),
        ];
        let ranked = rerank(&request("beta gamma", &[]), &results, &RankingConfig::default());
        assert_eq!(ranked.len(), 3);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        let urls: HashSet<&str> = ranked.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls.len(), ranked.len());
    }

    #[test]
    fn tunable_weights_change_scores() {
        let weights = RankingConfig {
            title_token_weight: 10.0,
            ..Default::default()
        };
        let results = vec![raw("rust", "https://a.example/", None, None)];
        let ranked = rerank(&request("rust", &[]), &results, &weights);
        assert!((ranked[0].score - 10.0).abs() < f64::EPSILON);
    }
}
