//! Minimal MCP server for smoke-testing an aggregator setup.
//!
//! Serves two tools on stdin/stdout:
//! - `echo` returns its arguments, serialized as JSON text
//! - `exit` terminates the process immediately, without answering

use std::sync::Arc;

use anyhow::Result;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, ServiceExt, model::*,
    service::RequestContext,
};
use tracing::{info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Exit status used by the `exit` tool.
const EXIT_STATUS: i32 = 70;

#[derive(Debug, Clone, Copy)]
struct EchoServer;

impl EchoServer {
    fn tools() -> Vec<Tool> {
        let schema: JsonObject = serde_json::from_value(serde_json::json!({
            "type": "object",
            "additionalProperties": true
        }))
        .unwrap_or_default();
        let schema = Arc::new(schema);

        vec![
            Tool::new("echo", "Return the call arguments as JSON text", Arc::clone(&schema)),
            Tool::new("exit", "Terminate the server process immediately", schema),
        ]
    }
}

impl ServerHandler for EchoServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Echoes tool arguments back to the caller.".to_string()),
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
        Ok(ListToolsResult {
            tools: Self::tools(),
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
        match request.name.as_ref() {
            "echo" => {
                let arguments = serde_json::Value::Object(request.arguments.unwrap_or_default());
                Ok(CallToolResult::success(vec![Content::text(arguments.to_string())]))
            }
            "exit" => {
                warn!("Exiting on request");
                std::process::exit(EXIT_STATUS);
            }
            other => Err(McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("Tool not found: {other}"),
                None,
            )),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let service = EchoServer.serve(rmcp::transport::stdio()).await?;
    info!("Echo server ready");
    service.waiting().await?;
    Ok(())
}
