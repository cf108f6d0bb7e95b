//! MCP server handler implementation.
//!
//! Maps each tool call onto one worker event or cache inspection.
use crate::tools::cache::{CacheGetParams, CacheKeysParams, get_impl, keys_impl};
use crate::tools::fetch::{SwFetchParams, fetch_impl};
use crate::tools::lifecycle::{activate_impl, install_impl, status_impl};
use crate::tools::notify::{SwNotificationClickParams, SwPushParams, click_impl, push_impl};

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
use swproxy_core::{RecordingHost, ServiceWorker};

/// The MCP server handler driving one service worker.
#[derive(Clone)]
pub struct SwProxyServer {
    tool_router: ToolRouter<Self>,
    worker: ServiceWorker,
    host: RecordingHost,
}

#[tool_router]
impl SwProxyServer {
    /// Create a handler around a worker and the host it reports effects to.
    pub fn new(worker: ServiceWorker, host: RecordingHost) -> Self {
        Self { tool_router: Self::tool_router(), worker, host }
    }

    /// The worker driven by this handler.
    pub fn worker(&self) -> &ServiceWorker {
        &self.worker
    }

    #[tool(
        description = "Deliver the install event: precache the app shell into the current cache generation. Fails without writing anything if any precache URL fails."
    )]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker, &self.host).await
    }

    #[tool(description = "Deliver the activate event: delete every cache generation except the current one.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker, &self.host).await
    }

    #[tool(description = "Report the worker lifecycle state, current cache generation and scope.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker)
    }

    /// Intercept a request the way a controlled page would.
    ///
    /// URLs containing /album/ go network-first and are never cached; everything
    /// else is served cache-first with a background write on a miss.
    #[tool(
        description = "Deliver a fetch event for a URL in the worker scope. Returns the response, the route taken and whether it came from the cache."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a push message. Shows a notification whose body is the payload text.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.worker, &self.host, params.0).await
    }

    #[tool(
        description = "Deliver a notification click. The 'explore' action opens the app; any other action only closes the notification."
    )]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(&self.worker, &self.host, params.0).await
    }

    #[tool(description = "List cache generations, or the entry keys of one generation.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(&self.worker, params.0).await
    }

    #[tool(description = "Look a URL up across all cache generations without touching the network.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for SwProxyServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swproxy".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some("Drives an offline-first caching worker. Call sw_install and sw_activate before sw_fetch.".into()),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::worker;

    #[test]
    fn test_lists_every_tool() {
        let (worker, host, _store) = worker(&[]);
        let server = SwProxyServer::new(worker, host);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            [
                "cache_get",
                "cache_keys",
                "sw_activate",
                "sw_fetch",
                "sw_install",
                "sw_notification_click",
                "sw_push",
                "sw_status",
            ]
        );
    }

    #[test]
    fn test_server_info() {
        let (worker, host, _store) = worker(&[]);
        let info = SwProxyServer::new(worker, host).get_info();
        assert_eq!(info.server_info.name, "swproxy");
        assert!(info.capabilities.tools.is_some());
    }
}
