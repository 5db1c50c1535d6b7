//! sw_activate tool implementation.
//!
//! Dispatches the activate signal: evict superseded generations and claim
//! open sessions.

use frost_client::{ServiceWorker, Transport};
use rmcp::{ErrorData as McpError, model::CallToolResult};

use super::json_result;

/// Implementation of the sw_activate tool.
pub async fn activate_impl<T: Transport>(worker: &ServiceWorker<T>) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    json_result(&report)
}
