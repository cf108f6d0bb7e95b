//! sw_fetch tool implementation.
//!
//! Delivers a fetch event for a URL inside the worker scope and returns the
//! response the page would have received.

use rmcp::ErrorData as McpError;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swproxy_core::{Method, Request, ResponseSource, ResponseType, Route, ServiceWorker};

use crate::error::{ToolError, json_result};

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL to request; relative paths resolve against the worker scope.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Wait for the background cache write before returning (default: true).
    #[serde(default = "default_true")]
    pub wait_for_cache: bool,
}

fn default_true() -> bool {
    true
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize)]
pub struct SwFetchOutput {
    /// The resolved request URL.
    pub url: String,
    /// Strategy the request was routed to.
    pub route: Route,
    /// Whether the response came from the network or the cache.
    pub source: ResponseSource,
    pub status: u16,
    #[serde(rename = "type")]
    pub kind: ResponseType,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    /// Number of background cache writes awaited.
    pub cache_writes: usize,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &ServiceWorker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }

    let method: Method = match params.method.as_deref() {
        Some(m) => m.parse().map_err(|_| ToolError::InvalidInput(format!("unsupported method: {m}")))?,
        None => Method::Get,
    };

    let request = Request::resolve(&worker.config().scope, &params.url)?.with_method(method);
    let url = request.url.to_string();
    let route = worker.classify(&request);

    let response = worker.on_fetch(request).await?;
    let cache_writes = if params.wait_for_cache { worker.drain_pending_writes().await } else { 0 };

    let output = SwFetchOutput {
        url,
        route,
        source: response.source(),
        status: response.status(),
        kind: response.kind(),
        headers: response.headers().to_vec(),
        body: response.text(),
        cache_writes,
    };

    json_result(&output)
}
