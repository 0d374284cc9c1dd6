//! Connection seam between the tool catalog and the child servers.
//!
//! The registry and router only ever talk to a child through
//! [`ToolConnection`]. The live implementation is the rmcp client peer of a
//! child process session.

use async_trait::async_trait;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolRequestParam, CallToolResult, Tool},
    service::{Peer, RoleClient, ServiceError},
};
use thiserror::Error;

/// Failure of a request forwarded to a child.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The child answered with a protocol error of its own.
    #[error("{0}")]
    Child(McpError),

    /// The connection itself failed (closed, send failure, timeout, ...).
    #[error("{0}")]
    Transport(String),
}

impl From<ServiceError> for ForwardError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::McpError(data) => Self::Child(data),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// A request/response session with one child server.
#[async_trait]
pub trait ToolConnection: Send + Sync {
    /// Fetch the child's full tool catalog.
    async fn list_tools(&self) -> Result<Vec<Tool>, ForwardError>;

    /// Call one tool on the child. The request is passed through untouched.
    async fn call_tool(&self, request: CallToolRequestParam)
    -> Result<CallToolResult, ForwardError>;
}

#[async_trait]
impl ToolConnection for Peer<RoleClient> {
    async fn list_tools(&self) -> Result<Vec<Tool>, ForwardError> {
        Ok(self.list_all_tools().await?)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, ForwardError> {
        Ok(Peer::call_tool(self, request).await?)
    }
}
