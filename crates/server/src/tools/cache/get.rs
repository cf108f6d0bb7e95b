//! cache_get tool implementation.
//!
//! Looks a URL up across every generation without touching the network.

use rmcp::ErrorData as McpError;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swproxy_core::{Error, Request, ResponseType, ServiceWorker};

use crate::error::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL to look up; relative paths resolve against the worker scope.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheGetOutput {
    pub url: String,
    pub status: u16,
    #[serde(rename = "type")]
    pub kind: ResponseType,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &ServiceWorker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let request = Request::resolve(&worker.config().scope, &params.url)?;
    let response = worker
        .caches()
        .match_request(&request)
        .await?
        .ok_or_else(|| Error::CacheMiss(request.url.to_string()))?;

    let output = CacheGetOutput {
        url: response.url().to_string(),
        status: response.status(),
        kind: response.kind(),
        headers: response.headers().to_vec(),
        body: response.text(),
    };

    json_result(&output)
}
