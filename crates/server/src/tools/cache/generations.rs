//! cache_generations tool implementation.
//!
//! Lists every stored generation with its install state.

use frost_client::{ServiceWorker, Transport};
use frost_core::Generation;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Output from the cache_generations tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGenerationsOutput {
    /// Version label of this worker.
    pub current: String,
    /// Version label requests are answered from; differs from `current`
    /// until this worker's install succeeds.
    pub serving: String,
    /// Stored generations, oldest first.
    pub generations: Vec<Generation>,
}

/// Implementation of the cache_generations tool.
pub async fn generations_impl<T: Transport>(worker: &ServiceWorker<T>) -> Result<CallToolResult, McpError> {
    let generations = worker.db().list_generations().await?;
    let serving = worker.serving_version().await;
    json_result(&CacheGenerationsOutput { current: worker.version().to_string(), serving, generations })
}
