//! Stdin/stdout JSON bridge for tool calls.
//!
//! Reads newline-delimited JSON [`ToolCall`] messages, runs them through a
//! [`ToolDispatcher`] and writes one [`ToolResponse`] per line. Calls are
//! handled concurrently, so responses may come back out of order; hosts
//! match them up by `request_id`.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr.

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use sift_search::SearchBackend;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{GatewayError, Result};
use crate::host::contract::{ToolCall, ToolResponse};
use crate::host::dispatch::ToolDispatcher;

/// Request id used when a line cannot be parsed as a [`ToolCall`].
pub const PARSE_ERROR_ID: &str = "parse-error";

/// Run the bridge over the process's stdin and stdout until stdin closes.
pub async fn run_stdio_bridge<B: SearchBackend>(dispatcher: &ToolDispatcher<B>) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    run_bridge(dispatcher, stdin, &mut stdout).await
}

/// Run the bridge over arbitrary line input and output.
///
/// Returns once `reader` reaches EOF and every in-flight call has been
/// answered.
pub async fn run_bridge<B, R, W>(
    dispatcher: &ToolDispatcher<B>,
    reader: R,
    writer: &mut W,
) -> Result<()>
where
    B: SearchBackend,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut in_flight = FuturesUnordered::new();
    let mut reading = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if reading => {
                let line = line
                    .map_err(|e| GatewayError::Channel(format!("failed to read input: {e}")))?;
                let Some(line) = line else {
                    tracing::info!("input closed (EOF); draining in-flight calls");
                    reading = false;
                    continue;
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str::<ToolCall>(trimmed) {
                    Ok(call) => in_flight.push(dispatcher.handle(call)),
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to parse tool call");
                        let response = ToolResponse::error(
                            PARSE_ERROR_ID,
                            "parse_error",
                            format!("failed to parse tool call: {e}"),
                        );
                        write_response(writer, &response).await?;
                    }
                }
            }
            Some(response) = in_flight.next(), if !in_flight.is_empty() => {
                write_response(writer, &response).await?;
            }
            else => break,
        }
    }
    Ok(())
}

/// Write one response as a JSON line and flush.
async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &ToolResponse,
) -> Result<()> {
    let mut json = serde_json::to_string(response)
        .map_err(|e| GatewayError::Channel(format!("failed to serialize response: {e}")))?;
    json.push('\n');
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| GatewayError::Channel(format!("failed to write output: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| GatewayError::Channel(format!("failed to flush output: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::config::GatewayConfig;
    use crate::gateway::Gateway;
    use sift_search::{
        NetworkAccessPolicy, PolicyConfig, SearchError, SearchParams, SearchResult,
    };
    use std::sync::Arc;
    use std::time::Duration;

    /// Sleeps longer for the query "slow" so responses finish out of order.
    struct TimedBackend;

    impl SearchBackend for TimedBackend {
        async fn search(
            &self,
            params: &SearchParams,
        ) -> std::result::Result<Vec<SearchResult>, SearchError> {
            let delay = if params.query == "slow" { 200 } else { 0 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(vec![SearchResult {
                title: params.query.clone(),
                url: format!("https://{}.example/", params.query),
                ..Default::default()
            }])
        }
    }

    fn dispatcher() -> ToolDispatcher<TimedBackend> {
        let guard = Arc::new(NetworkAccessPolicy::new(&PolicyConfig::default()));
        let gateway =
            Gateway::with_parts(GatewayConfig::default(), TimedBackend, guard).expect("gateway");
        ToolDispatcher::new(Arc::new(gateway))
    }

    async fn run_lines(input: &str) -> Vec<ToolResponse> {
        let d = dispatcher();
        let mut out = Vec::new();
        run_bridge(&d, input.as_bytes(), &mut out).await.expect("bridge");
        String::from_utf8(out)
            .expect("utf8")
            .lines()
            .map(|l| serde_json::from_str(l).expect("response line"))
            .collect()
    }

    #[tokio::test]
    async fn bad_line_gets_parse_error_and_bridge_continues() {
        let input = concat!(
            "this is not json\n",
            "\n",
            r#"{"request_id":"ok-1","tool":"sift_web_search","arguments":{"query":"fast"}}"#,
            "\n"
        );
        let responses = run_lines(input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].request_id, PARSE_ERROR_ID);
        assert_eq!(responses[0].error.as_ref().expect("error").code, "parse_error");
        assert_eq!(responses[1].request_id, "ok-1");
        assert!(responses[1].ok);
    }

    #[tokio::test]
    async fn calls_run_concurrently() {
        let input = concat!(
            r#"{"request_id":"a","tool":"sift_web_search","arguments":{"query":"slow"}}"#,
            "\n",
            r#"{"request_id":"b","tool":"sift_web_search","arguments":{"query":"fast"}}"#,
            "\n"
        );
        let responses = run_lines(input).await;
        let ids: Vec<_> = responses.iter().map(|r| r.request_id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert!(responses.iter().all(|r| r.ok));
    }

    #[tokio::test]
    async fn empty_input_exits_cleanly() {
        assert!(run_lines("").await.is_empty());
    }
}
