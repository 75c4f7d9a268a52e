use std::convert::Infallible;

use sift_search::pool::run_bounded;
use sift_search::query::{detect_intent, expand_queries, intent_boost_domains};
use sift_search::rank::dedup::merge_ranked;
use sift_search::rank::scoring::{RankRequest, rerank};
use sift_search::{SearchBackend, SearchParams};
use tracing::{info, warn};

use super::types::{FetchResponse, QueryResults, ResearchArgs, ResearchResponse};
use super::{Gateway, tech_list, usable};
use crate::error::Result;

impl<B: SearchBackend> Gateway<B> {
    /// Expand `question` into several queries, search each, merge the
    /// ranked sets and optionally fetch the top documents.
    ///
    /// Queries run one after another. Document fetches run with bounded
    /// concurrency; a document that cannot be fetched is left out.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GatewayError::InvalidArgument`] for out-of-range
    /// arguments, or the first upstream failure.
    pub async fn research(&self, args: ResearchArgs) -> Result<ResearchResponse> {
        args.validate()?;
        let intent = detect_intent(&args.question);
        let language = self.resolve_language(args.lang.as_deref(), &args.question);
        let safesearch = args.safe.unwrap_or(self.config.search.default_safesearch);
        let queries = expand_queries(&args.question, intent, &language, args.max_queries);

        let tech = tech_list(&self.config, intent.is_technical());
        let intent_domains = intent_boost_domains(intent, &self.config.ranking.tech_domain_boost);

        let mut per_query = Vec::with_capacity(queries.len());
        for query in queries {
            let mut params = SearchParams::new(query.as_str(), language.as_str());
            params.safesearch = safesearch;
            let raw = self.backend.search(&params).await?;

            let request = RankRequest {
                query: &query,
                tech_domains: &tech,
                intent_domains: &intent_domains,
                ..RankRequest::default()
            };
            let mut results = rerank(&request, &usable(raw), &self.config.ranking);
            results.truncate(args.per_query_limit);
            per_query.push(QueryResults { query, results });
        }

        let final_results = merge_ranked(
            per_query.iter().map(|q| q.results.clone()),
            self.config.search.max_final_results,
        );

        let targets: Vec<String> = final_results
            .iter()
            .take(args.fetch_top_k)
            .map(|r| r.url.clone())
            .collect();
        let fetch_mode = args.fetch_mode;
        let fetched = run_bounded(targets, self.config.search.verify_concurrency, |url| async move {
            match self.fetcher.fetch(&url, fetch_mode, None).await {
                Ok(document) => Ok::<_, Infallible>(Some(FetchResponse {
                    document,
                    mode: fetch_mode,
                })),
                Err(e) => {
                    warn!(url = %url, error = %e, "research document skipped");
                    Ok(None)
                }
            }
        })
        .await;
        let documents = match fetched {
            Ok(documents) => documents.into_iter().flatten().collect::<Vec<_>>(),
            Err(never) => match never {},
        };

        info!(
            queries = per_query.len(),
            results = final_results.len(),
            documents = documents.len(),
            "research complete"
        );
        Ok(ResearchResponse {
            queries: per_query,
            final_results,
            documents,
        })
    }
}
