//! Content fetching over two strategies: plain HTTP with readability
//! extraction, and headless-browser rendering.
//!
//! [`ContentFetcher::fetch`] always runs the [`TargetGuard`] first. `auto`
//! mode is a single decision, not a loop: it runs HTTP, then either
//! returns that document or escalates once to rendering.

pub mod http;
pub mod render;

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::info;
use url::Url;

use crate::config::FetchConfig;
use crate::content::{clip_chars, is_html_content_type};
use crate::error::{Result, SearchError};
use crate::policy::TargetGuard;
use crate::types::{FetchMode, FetchStrategy, FetchedDocument};

pub use render::{AgentBrowserRenderer, RenderedPage, Renderer};

/// Fetches page text through the network policy.
pub struct ContentFetcher {
    client: reqwest::Client,
    guard: Arc<dyn TargetGuard>,
    renderer: Arc<dyn Renderer>,
    config: FetchConfig,
}

impl ContentFetcher {
    /// Build a fetcher that renders through the configured browser driver.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: FetchConfig, guard: Arc<dyn TargetGuard>) -> Result<Self> {
        let renderer = Arc::new(AgentBrowserRenderer::new(&config));
        Ok(Self {
            client: crate::http::build_fetch_client(&config)?,
            guard,
            renderer,
            config,
        })
    }

    /// Replace the rendering backend.
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch `url` using `mode`, clipping text to `max_chars` (or the
    /// configured default).
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidUrl`] if `url` does not parse.
    /// - [`SearchError::ForbiddenTarget`] if the policy rejects the target
    ///   or any redirect hop.
    /// - [`SearchError::FeatureDisabled`] for `rendered` when rendering is off.
    /// - [`SearchError::FetchTimeout`] / [`SearchError::RenderTimeout`] when a
    ///   budget is exceeded.
    /// - [`SearchError::Fetch`] / [`SearchError::Render`] for other failures.
    pub async fn fetch(
        &self,
        url: &str,
        mode: FetchMode,
        max_chars: Option<usize>,
    ) -> Result<FetchedDocument> {
        let target = Url::parse(url.trim()).map_err(|e| SearchError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        self.guard.assert_allowed(&target).await?;

        let max_chars = max_chars.unwrap_or(self.config.max_chars);

        match mode {
            FetchMode::Rendered => self.fetch_rendered(&target, max_chars).await,
            FetchMode::Http => {
                let fetched = self.fetch_http(&target, max_chars).await?;
                Ok(fetched.document)
            }
            FetchMode::Auto => {
                let fetched = self.fetch_http(&target, max_chars).await?;
                if should_escalate(
                    self.config.enable_rendered,
                    &fetched.document.content_text,
                    fetched.content_type.as_deref(),
                    self.config.weak_extraction_chars,
                ) {
                    info!(url = %target, "weak HTTP extraction, escalating to rendered fetch");
                    return self.fetch_rendered(&target, max_chars).await;
                }
                Ok(fetched.document)
            }
        }
    }

    async fn fetch_http(&self, target: &Url, max_chars: usize) -> Result<http::HttpFetch> {
        http::fetch_http(
            &self.client,
            self.guard.as_ref(),
            target,
            &self.config,
            max_chars,
        )
        .await
    }

    async fn fetch_rendered(&self, target: &Url, max_chars: usize) -> Result<FetchedDocument> {
        if !self.config.enable_rendered {
            return Err(SearchError::FeatureDisabled(
                "rendered fetch is not enabled".into(),
            ));
        }
        let page = self.renderer.render(target).await?;
        let final_url = page.final_url.unwrap_or_else(|| target.to_string());
        Ok(build_document(
            target.as_str(),
            final_url,
            page.title,
            &page.text,
            max_chars,
            false,
            FetchStrategy::Rendered,
        ))
    }
}

/// `auto` escalates when rendering is enabled, the trimmed text is shorter
/// than `threshold` characters, and the content type is HTML or unknown.
pub fn should_escalate(
    rendering_enabled: bool,
    text: &str,
    content_type: Option<&str>,
    threshold: usize,
) -> bool {
    rendering_enabled
        && text.trim().chars().count() < threshold
        && content_type.map_or(true, is_html_content_type)
}

/// Clip, hash and timestamp extracted text.
pub(crate) fn build_document(
    url: &str,
    final_url: String,
    title: Option<String>,
    text: &str,
    max_chars: usize,
    body_truncated: bool,
    strategy: FetchStrategy,
) -> FetchedDocument {
    let (content_text, clipped) = clip_chars(text, max_chars);
    let digest = Sha256::digest(content_text.as_bytes());
    FetchedDocument {
        url: url.to_owned(),
        final_url,
        title,
        content_sha256: format!("{digest:x}"),
        content_text,
        truncated: body_truncated || clipped,
        retrieved_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        strategy,
    }
}
