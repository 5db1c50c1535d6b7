//! cache_keys tool implementation.
//!
//! Lists the request URLs stored in a generation.

use frost_client::{ServiceWorker, Transport};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Version label to inspect (default: the current generation).
    #[serde(default)]
    pub version: Option<String>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub version: String,
    /// Stored request URLs; empty for unknown or deleted generations.
    pub urls: Vec<String>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl<T: Transport>(
    worker: &ServiceWorker<T>, params: CacheKeysParams,
) -> Result<CallToolResult, McpError> {
    let version = params.version.unwrap_or_else(|| worker.version().to_string());
    let urls = worker.db().keys(&version).await?;
    json_result(&CacheKeysOutput { version, urls })
}
