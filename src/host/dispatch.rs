//! Routes [`ToolCall`]s to gateway operations.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sift_search::SearchBackend;
use tracing::{debug, warn};

use crate::error::{GatewayError, Result};
use crate::gateway::Gateway;
use crate::host::contract::{PROTOCOL_VERSION, ToolCall, ToolName, ToolRegistry, ToolResponse};

const ANONYMOUS: &str = "anonymous";

/// Admits, decodes and runs tool calls against one [`Gateway`].
pub struct ToolDispatcher<B> {
    gateway: Arc<Gateway<B>>,
    registry: ToolRegistry,
}

impl<B: SearchBackend> ToolDispatcher<B> {
    pub fn new(gateway: Arc<Gateway<B>>) -> Self {
        let registry = ToolRegistry::new(&gateway.config().host);
        Self { gateway, registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one call. Never fails: every error becomes an error response.
    pub async fn handle(&self, mut call: ToolCall) -> ToolResponse {
        if call.request_id.trim().is_empty() {
            call.request_id = uuid::Uuid::new_v4().to_string();
        }
        let request_id = call.request_id.clone();

        if call.v != PROTOCOL_VERSION {
            return ToolResponse::error(
                request_id,
                "unsupported_version",
                format!(
                    "unsupported protocol version {}; expected {PROTOCOL_VERSION}",
                    call.v
                ),
            );
        }
        let Some(tool) = self.registry.resolve(&call.tool) else {
            return ToolResponse::error(
                request_id,
                "unknown_tool",
                format!("unknown tool {:?}", call.tool),
            );
        };

        let identity = call
            .identity
            .as_deref()
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .unwrap_or(ANONYMOUS);

        debug!(request_id = %request_id, tool = tool.as_str(), "tool call");
        match self.run(tool, identity, call.arguments).await {
            Ok((structured, text)) => ToolResponse::ok(request_id, structured, text),
            Err(e) => {
                warn!(
                    request_id = %request_id,
                    tool = tool.as_str(),
                    code = e.code(),
                    error = %e,
                    "tool call failed"
                );
                ToolResponse::error(request_id, e.code(), e.to_string())
            }
        }
    }

    async fn run(
        &self,
        tool: ToolName,
        identity: &str,
        arguments: serde_json::Value,
    ) -> Result<(serde_json::Value, String)> {
        self.gateway.admit(identity)?;
        let gw = &self.gateway;
        match tool {
            ToolName::WebSearch => {
                let out = gw.search(decode(arguments)?).await?;
                encode(&out, out.render_text())
            }
            ToolName::WebImageSearch => {
                let out = gw.image_search(decode(arguments)?).await?;
                encode(&out, out.render_text())
            }
            ToolName::WebResearch => {
                let out = gw.research(decode(arguments)?).await?;
                encode(&out, out.render_text())
            }
            ToolName::WebFetch => {
                let out = gw.fetch(decode(arguments)?).await?;
                encode(&out, out.render_text())
            }
        }
    }
}

fn decode<T: DeserializeOwned>(arguments: serde_json::Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| GatewayError::InvalidArgument(e.to_string()))
}

fn encode<T: Serialize>(value: &T, text: String) -> Result<(serde_json::Value, String)> {
    let structured = serde_json::to_value(value)
        .map_err(|e| GatewayError::Channel(format!("failed to serialize result: {e}")))?;
    Ok((structured, text))
}
