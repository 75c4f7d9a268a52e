//! Plain HTTP strategy: timed, byte-capped GET with guarded redirects.

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::config::FetchConfig;
use crate::content::{extract_readable, is_html_content_type};
use crate::error::{Result, SearchError};
use crate::http::FETCH_ACCEPT;
use crate::policy::TargetGuard;
use crate::types::{FetchStrategy, FetchedDocument};

use super::build_document;

/// Result of the HTTP strategy plus the header `auto` mode inspects.
#[derive(Debug, Clone)]
pub struct HttpFetch {
    pub document: FetchedDocument,
    pub content_type: Option<String>,
}

/// Fetch `target` over HTTP.
///
/// The caller has already validated `target`; every redirect hop is
/// validated here before it is requested. The whole exchange, body
/// included, is bounded by `config.timeout_ms`.
///
/// # Errors
///
/// See [`super::ContentFetcher::fetch`].
pub async fn fetch_http(
    client: &reqwest::Client,
    guard: &dyn TargetGuard,
    target: &Url,
    config: &FetchConfig,
    max_chars: usize,
) -> Result<HttpFetch> {
    let budget = Duration::from_millis(config.timeout_ms);
    tokio::time::timeout(budget, fetch_inner(client, guard, target, config, max_chars))
        .await
        .map_err(|_| SearchError::FetchTimeout {
            url: target.to_string(),
            timeout_ms: config.timeout_ms,
        })?
}

async fn fetch_inner(
    client: &reqwest::Client,
    guard: &dyn TargetGuard,
    target: &Url,
    config: &FetchConfig,
    max_chars: usize,
) -> Result<HttpFetch> {
    let fetch_err = |reason: String| SearchError::Fetch {
        url: target.to_string(),
        reason,
    };

    let mut current = target.clone();
    let mut hops = 0usize;

    let mut response = loop {
        let response = client
            .get(current.clone())
            .header(reqwest::header::ACCEPT, FETCH_ACCEPT)
            .send()
            .await
            .map_err(|e| fetch_err(format!("request failed: {e}")))?;

        if !response.status().is_redirection() {
            break response;
        }

        let Some(location) = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
        else {
            break response;
        };

        hops += 1;
        if hops > config.max_redirects {
            return Err(fetch_err(format!(
                "too many redirects (limit {})",
                config.max_redirects
            )));
        }

        let next = current
            .join(location)
            .map_err(|e| fetch_err(format!("invalid redirect location: {e}")))?;
        guard.assert_allowed(&next).await?;
        debug!(from = %current, to = %next, "following redirect");
        current = next;
    };

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_err(format!("HTTP {}", status.as_u16())));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let mut body: Vec<u8> = Vec::new();
    let mut body_truncated = false;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| fetch_err(format!("body read failed: {e}")))?
    {
        let remaining = config.max_bytes.saturating_sub(body.len());
        if chunk.len() > remaining {
            body.extend_from_slice(&chunk[..remaining]);
            body_truncated = true;
            break;
        }
        body.extend_from_slice(&chunk);
    }
    let raw = String::from_utf8_lossy(&body);

    let (title, text) = match content_type.as_deref() {
        Some(ct) if is_html_content_type(ct) => {
            let extracted = extract_readable(&raw);
            (extracted.title, extracted.text)
        }
        _ => (None, raw.into_owned()),
    };

    let document = build_document(
        target.as_str(),
        current.to_string(),
        title,
        &text,
        max_chars,
        body_truncated,
        FetchStrategy::Http,
    );

    Ok(HttpFetch {
        document,
        content_type,
    })
}
