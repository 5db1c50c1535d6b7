//! sw_fetch tool implementation.
//!
//! Dispatches one intercepted request. Requests the worker passes through
//! are sent to the network by the host with no caching side effect.

use std::collections::BTreeMap;

use frost_client::{Destination, Disposition, PassthroughReason, Request, Response, ServiceWorker, Transport};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL of the resource.
    pub url: String,

    /// Request method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination: "document" for navigations, or "script",
    /// "style", "image", "font", "manifest", "empty" (default).
    #[serde(default)]
    pub destination: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// URL the response was produced for.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// "cache", "network", "fallback", or "passthrough".
    pub source: String,
    /// Why the worker did not intercept the request, if it did not.
    pub passthrough_reason: Option<String>,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Body as text, when it is valid UTF-8.
    pub body_text: Option<String>,
    /// Body length in bytes.
    pub body_len: usize,
}

impl SwFetchOutput {
    fn new(response: &Response, source: &str, passthrough_reason: Option<String>) -> Self {
        let headers = response
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        Self {
            url: response.url.to_string(),
            status: response.status.as_u16(),
            source: source.to_string(),
            passthrough_reason,
            headers,
            body_text: std::str::from_utf8(&response.body).ok().map(str::to_string),
            body_len: response.body.len(),
        }
    }
}

fn label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<T: Transport>(
    worker: &ServiceWorker<T>, transport: &T, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    let destination = match params.destination.as_deref() {
        Some(value) => value.parse::<Destination>()?,
        None => Destination::Empty,
    };
    let request = Request::parse(&params.method, &params.url, destination)?;

    let output = match worker.handle_request(&request).await? {
        Disposition::Responded { response, source } => SwFetchOutput::new(&response, &label(&source), None),
        Disposition::Passthrough(reason) => {
            tracing::debug!("passing {} {} through: {:?}", request.method, request.url, reason);
            let response = transport.fetch(&request).await?;
            SwFetchOutput::new(&response, "passthrough", Some(label::<PassthroughReason>(&reason)))
        }
    };

    json_result(&output)
}
