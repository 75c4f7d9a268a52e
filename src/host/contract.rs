//! Versioned tool call/response envelopes for host integrations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::HostConfig;

/// Contract version for tool envelopes.
pub const PROTOCOL_VERSION: u32 = 1;

fn protocol_version() -> u32 {
    PROTOCOL_VERSION
}

/// The four tools the gateway exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    WebSearch,
    WebImageSearch,
    WebResearch,
    WebFetch,
}

impl ToolName {
    pub const ALL: [Self; 4] = [
        Self::WebSearch,
        Self::WebImageSearch,
        Self::WebResearch,
        Self::WebFetch,
    ];

    /// Unprefixed wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WebSearch => "web_search",
            Self::WebImageSearch => "web_image_search",
            Self::WebResearch => "web_research",
            Self::WebFetch => "web_fetch",
        }
    }
}

/// A tool invocation from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default = "protocol_version")]
    pub v: u32,
    /// Echoed on the response; generated when empty.
    #[serde(default)]
    pub request_id: String,
    /// Tool name as exposed by the [`ToolRegistry`].
    pub tool: String,
    /// Caller identity for rate limiting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCall {
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        tool: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            request_id: request_id.into(),
            tool: tool.into(),
            identity: None,
            arguments,
        }
    }
}

/// Machine-readable failure attached to an unsuccessful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub code: String,
    pub message: String,
}

/// Response to one [`ToolCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub v: u32,
    pub request_id: String,
    pub ok: bool,
    pub structured: serde_json::Value,
    /// Human-readable rendering of `structured`.
    pub text: String,
    pub error: Option<ToolFailure>,
}

impl ToolResponse {
    #[must_use]
    pub fn ok(
        request_id: impl Into<String>,
        structured: serde_json::Value,
        text: impl Into<String>,
    ) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            request_id: request_id.into(),
            ok: true,
            structured,
            text: text.into(),
            error: None,
        }
    }

    #[must_use]
    pub fn error(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self {
            v: PROTOCOL_VERSION,
            request_id: request_id.into(),
            ok: false,
            structured: serde_json::Value::Null,
            text: message.clone(),
            error: Some(ToolFailure {
                code: code.into(),
                message,
            }),
        }
    }
}

/// Maps exposed tool names to [`ToolName`].
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    names: HashMap<String, ToolName>,
    exposed: Vec<String>,
}

impl ToolRegistry {
    /// Names are `<prefix>_<tool>`, or bare when the prefix is empty.
    /// Legacy mode also registers the bare names next to the prefixed ones.
    #[must_use]
    pub fn new(config: &HostConfig) -> Self {
        let prefix = config.tool_prefix.trim();
        let mut names = HashMap::new();
        let mut exposed = Vec::new();

        for tool in ToolName::ALL {
            let primary = if prefix.is_empty() {
                tool.as_str().to_owned()
            } else {
                format!("{prefix}_{}", tool.as_str())
            };
            exposed.push(primary.clone());
            names.insert(primary, tool);

            if config.legacy_tool_names && !prefix.is_empty() {
                names.insert(tool.as_str().to_owned(), tool);
            }
        }
        Self { names, exposed }
    }

    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ToolName> {
        self.names.get(name.trim()).copied()
    }

    /// Primary (non-legacy) names, in [`ToolName::ALL`] order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.exposed
    }
}
