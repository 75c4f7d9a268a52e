use sift_search::SearchBackend;
use tracing::debug;

use super::Gateway;
use super::types::{FetchArgs, FetchResponse};
use crate::error::Result;

impl<B: SearchBackend> Gateway<B> {
    /// Fetch one URL through the network policy.
    ///
    /// Not cached: every call re-validates and re-fetches the target.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GatewayError::InvalidArgument`] for bad arguments and
    /// [`crate::GatewayError::Search`] wrapping the fetch failure otherwise
    /// (forbidden target, timeout, rendering disabled, ...).
    pub async fn fetch(&self, args: FetchArgs) -> Result<FetchResponse> {
        args.validate()?;
        let document = self
            .fetcher
            .fetch(args.url.trim(), args.mode, args.max_chars)
            .await?;
        debug!(
            url = %document.final_url,
            strategy = ?document.strategy,
            truncated = document.truncated,
            "fetched"
        );
        Ok(FetchResponse {
            document,
            mode: args.mode,
        })
    }
}
