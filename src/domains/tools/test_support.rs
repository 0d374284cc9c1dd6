//! Fakes shared by the unit tests of several modules.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, CallToolResult, Content, Tool};

use super::connection::{ForwardError, ToolConnection};

/// A connection that answers from a fixed catalog and echoes calls.
pub(crate) struct StaticConnection {
    pub(crate) tools: Vec<Tool>,
}

#[async_trait]
impl ToolConnection for StaticConnection {
    async fn list_tools(&self) -> Result<Vec<Tool>, ForwardError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, ForwardError> {
        Ok(CallToolResult::success(vec![Content::text(
            request.name.to_string(),
        )]))
    }
}

pub(crate) fn tool(name: &str) -> Tool {
    Tool::new(
        name.to_string(),
        format!("{name} description"),
        Arc::new(serde_json::Map::new()),
    )
}

pub(crate) fn connection(names: &[&str]) -> Arc<dyn ToolConnection> {
    Arc::new(StaticConnection {
        tools: names.iter().map(|n| tool(n)).collect(),
    })
}
