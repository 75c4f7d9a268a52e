//! Ranked web search with optional top-K verification.

use std::convert::Infallible;

use serde_json::json;
use sift_search::cache::request_key;
use sift_search::content::{clip_chars, collapse_whitespace};
use sift_search::pool::run_bounded;
use sift_search::query::{detect_intent, intent_boost_domains};
use sift_search::rank::scoring::{RankRequest, rerank};
use sift_search::{FetchMode, RankedResult, SearchBackend, SearchParams};
use tracing::{debug, warn};
use url::Url;

use super::types::{SearchArgs, SearchMode, SearchResponse};
use super::{CachedFetch, Gateway, tech_list, usable};
use crate::cursor::{decode_cursor, next_cursor};
use crate::error::Result;

impl<B: SearchBackend> Gateway<B> {
    /// Run a web search.
    ///
    /// Results are ranked, truncated to `limit`, and in `balanced`/`high`
    /// mode the top entries are verified by fetching them. A verification
    /// failure only marks that entry `verified: false`.
    ///
    /// # Errors
    ///
    /// - [`crate::GatewayError::InvalidArgument`] for an empty query or a
    ///   limit outside `1..=50`.
    /// - [`crate::GatewayError::InvalidCursor`] for a malformed cursor.
    /// - [`crate::GatewayError::Search`] when the upstream is unavailable.
    pub async fn search(&self, args: SearchArgs) -> Result<SearchResponse> {
        args.validate()?;
        let page = match args.cursor.as_deref() {
            Some(cursor) => decode_cursor(cursor)?,
            None => 1,
        };
        let intent = detect_intent(&args.query);
        let language = self.resolve_language(args.lang.as_deref(), &args.query);
        let safesearch = args.safe.unwrap_or(self.config.search.default_safesearch);
        let tech_bias = args.tech_bias.unwrap_or(intent.is_technical());

        let key = request_key(
            "search",
            &json!({
                "q": args.query,
                "page": page,
                "limit": args.limit,
                "language": language,
                "safesearch": safesearch.level(),
                "categories": args.categories,
                "time_range": args.time_range,
                "engines": args.engines,
                "tech_bias": tech_bias,
                "include_domains": args.include_domains,
                "exclude_domains": args.exclude_domains,
                "mode": args.mode,
            }),
        );
        if let Some(hit) = self.search_cache.get(&key).await {
            debug!(page, "search cache hit");
            return Ok(hit);
        }

        let mut params = SearchParams::new(args.query.as_str(), language.as_str());
        params.page = page;
        params.safesearch = safesearch;
        params.categories = args.categories.clone().unwrap_or_default();
        params.time_range = args.time_range.clone();
        params.engines = args.engines.clone().unwrap_or_default();

        let raw = self.backend.search(&params).await?;
        let upstream_had_results = !raw.is_empty();

        let tech = tech_list(&self.config, tech_bias);
        let intent_domains = intent_boost_domains(intent, &self.config.ranking.tech_domain_boost);
        let request = RankRequest {
            query: &args.query,
            tech_domains: &tech,
            intent_domains: &intent_domains,
            include_domains: args.include_domains.as_deref(),
            exclude_domains: args.exclude_domains.as_deref(),
        };
        let mut results = rerank(&request, &usable(raw), &self.config.ranking);
        results.truncate(args.limit as usize);

        self.verify_top(&mut results, args.mode).await;

        let response = SearchResponse {
            intent,
            language,
            results,
            next_cursor: next_cursor(page, upstream_had_results),
        };
        self.search_cache.insert(key, response.clone()).await;
        Ok(response)
    }

    /// Verify the first `mode.verify_top_k()` results in place.
    async fn verify_top(&self, results: &mut [RankedResult], mode: SearchMode) {
        let top_k = mode.verify_top_k().min(results.len());
        if top_k == 0 {
            return;
        }
        let fetch_mode = mode.verify_fetch_mode();
        let urls: Vec<String> = results[..top_k].iter().map(|r| r.url.clone()).collect();

        let outcomes = run_bounded(urls, self.config.search.verify_concurrency, |url| async move {
            Ok::<_, Infallible>(self.verify_one(&url, fetch_mode).await)
        })
        .await;
        let outcomes = match outcomes {
            Ok(outcomes) => outcomes,
            Err(never) => match never {},
        };

        // `outcomes[i]` belongs to `results[i]` whatever order fetches finished in.
        for (slot, outcome) in results.iter_mut().zip(outcomes) {
            match outcome {
                Some(fetched) => {
                    if let Some(title) = fetched.title.filter(|t| !t.trim().is_empty()) {
                        slot.title = title;
                    }
                    let collapsed = collapse_whitespace(&fetched.content_text);
                    let (snippet, _) = clip_chars(&collapsed, self.config.search.snippet_chars);
                    if !snippet.is_empty() {
                        slot.snippet = Some(snippet);
                    }
                    slot.verified = Some(true);
                }
                None => slot.verified = Some(false),
            }
        }
    }

    /// Fetch one result for verification; `None` on any failure.
    ///
    /// The network policy runs before the cache lookup so a cached entry
    /// never bypasses it.
    async fn verify_one(&self, url: &str, mode: FetchMode) -> Option<CachedFetch> {
        let target = match Url::parse(url) {
            Ok(target) => target,
            Err(e) => {
                warn!(url, error = %e, "verification skipped: unparseable URL");
                return None;
            }
        };
        if let Err(e) = self.guard.assert_allowed(&target).await {
            warn!(url, error = %e, "verification fetch refused");
            return None;
        }

        let key = format!("fetch:{url}");
        if let Some(hit) = self.fetch_cache.get(&key).await {
            debug!(url, "fetch cache hit");
            return Some(hit);
        }

        match self.fetcher.fetch(url, mode, None).await {
            Ok(document) => {
                let fetched = CachedFetch {
                    title: document.title,
                    content_text: document.content_text,
                };
                self.fetch_cache.insert(key, fetched.clone()).await;
                Some(fetched)
            }
            Err(e) => {
                warn!(url, error = %e, "verification fetch failed");
                None
            }
        }
    }
}
