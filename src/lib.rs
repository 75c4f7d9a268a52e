//! Sift: a search aggregation and safe-fetch gateway.
//!
//! Sift sits between tool-calling hosts and a self-hosted SearXNG instance:
//! Host → ToolDispatcher → Gateway → SearXNG / ContentFetcher
//!
//! # Architecture
//!
//! - **Search layer** (`sift-search`): upstream client, ranking, network
//!   policy, content fetching and caches
//! - **Gateway**: composes those into `web_search`, `web_image_search`,
//!   `web_research` and `web_fetch`, with pagination cursors and verification
//! - **Admission**: per-identity fixed-window rate limits
//! - **Host bridge**: newline-delimited JSON tool calls over stdin/stdout

pub mod config;
pub mod cursor;
pub mod error;
pub mod gateway;
pub mod host;
pub mod rate_limit;

pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::Gateway;
pub use host::contract::{ToolCall, ToolName, ToolRegistry, ToolResponse};
pub use host::dispatch::ToolDispatcher;
