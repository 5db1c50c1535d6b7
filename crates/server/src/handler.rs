//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker's lifecycle signals.
use std::sync::Arc;

use crate::tools::{
    SwFetchParams,
    activate::activate_impl,
    cache::{CacheKeysParams, generations_impl, keys_impl},
    fetch::fetch_impl,
    install::install_impl,
};
use frost_client::{FetchClient, ServiceWorker};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for frost-sw.
#[derive(Clone)]
pub struct FrostServer {
    tool_router: ToolRouter<Self>,
    worker: Arc<ServiceWorker<FetchClient>>,
    /// Used directly for requests the worker passes through.
    transport: Arc<FetchClient>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl FrostServer {
    /// Create a new server handler around a booted worker.
    pub fn new(worker: Arc<ServiceWorker<FetchClient>>, transport: Arc<FetchClient>) -> Self {
        Self { tool_router: Self::tool_router(), worker, transport }
    }

    #[tool(description = "Dispatch the install signal. Fetches every manifest resource and commits them as the \
                          current cache generation. Fails as a whole if any resource cannot be fetched.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(self.worker.as_ref()).await
    }

    #[tool(description = "Dispatch the activate signal. Deletes every cache generation except the current one \
                          and claims open clients.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(self.worker.as_ref()).await
    }

    /// Route one request through the worker.
    ///
    /// Cached responses are served first; misses go to the network and are
    /// stored when admissible. Document requests fall back to the entry point
    /// when the network is unreachable.
    #[tool(description = "Dispatch a fetch event. Returns the response with its source (cache, network, fallback) \
                          or performs a passthrough fetch when the worker declines the request.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(self.worker.as_ref(), self.transport.as_ref(), params.0).await
    }

    #[tool(description = "List stored cache generations with their state and entry counts.")]
    async fn cache_generations(&self) -> Result<CallToolResult, McpError> {
        generations_impl(self.worker.as_ref()).await
    }

    #[tool(description = "List the request URLs stored in a cache generation (default: the current one).")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(self.worker.as_ref(), params.0).await
    }
}

impl ServerHandler for FrostServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "frost-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Offline resource cache. Call sw_install then sw_activate, then route requests with sw_fetch.".into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
