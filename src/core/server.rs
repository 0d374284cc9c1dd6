//! The aggregator's MCP server handler.
//!
//! The handler owns no tools of its own. `tools/list` and `tools/call` are
//! answered by the [`NamespaceRouter`] from whatever the registry holds at the
//! moment of the request, so children that crash simply disappear from the
//! next listing.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use tracing::{info, instrument};

use super::config::Config;
use crate::domains::tools::NamespaceRouter;

/// The main MCP server handler.
#[derive(Clone)]
pub struct AggregatorServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Routes tool requests to the owning child.
    router: NamespaceRouter,

    /// Keys of the children that were started.
    children: Arc<[String]>,
}

impl AggregatorServer {
    /// Create a server answering from `router`.
    pub fn new(config: Arc<Config>, router: NamespaceRouter, children: Vec<String>) -> Self {
        Self {
            config,
            router,
            children: children.into(),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn router(&self) -> &NamespaceRouter {
        &self.router
    }

    fn instructions(&self) -> String {
        let separator = self.config.separator.as_str();
        if self.children.is_empty() {
            return "This server aggregates MCP servers, but none are configured.".to_string();
        }
        format!(
            "This server aggregates the tools of the MCP servers {}. \
             Every tool is named '<server>{separator}<tool>'.",
            self.children.join(", ")
        )
    }
}

impl ServerHandler for AggregatorServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: self.name().to_string(),
                version: self.version().to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(self.instructions()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = self.router.list_tools();
        info!(count = tools.len(), "Listing tools");
        Ok(ListToolsResult {
            tools,
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        info!("Calling tool");
        self.router.call_tool(request).await
    }
}
