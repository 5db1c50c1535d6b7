//! MCP tool implementations.
//!
//! Each tool dispatches one lifecycle signal (or one store inspection) to
//! the offline resource cache.

pub mod activate;
pub mod cache;
pub mod fetch;
pub mod install;

pub use fetch::SwFetchParams;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::HostError;

/// Encode a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| HostError::OutputEncoding(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
