//! Namespace Router - answers `tools/list` and dispatches `tools/call`.
//!
//! Listing is a straight snapshot of the registry. A call is routed by
//! splitting its name at the first separator, looking the full name up in the
//! registry and forwarding the request to the owning child with only the name
//! replaced by the child's own tool name.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolRequestParam, CallToolResult, Tool},
};
use tracing::{debug, instrument, warn};

use super::ToolError;
use super::connection::ForwardError;
use super::registry::CapabilityRegistry;

/// Routes tool calls to the child that owns them.
#[derive(Clone)]
pub struct NamespaceRouter {
    registry: Arc<CapabilityRegistry>,
}

impl NamespaceRouter {
    /// Create a router over the given registry.
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Every tool currently announced, unfiltered and unpaginated.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.registry.list_all()
    }

    /// Route one tool call.
    ///
    /// Arguments are forwarded untouched and the child's answer, success or
    /// error, is returned untouched. Only a failing connection is rewrapped,
    /// as an internal error that keeps the original message.
    #[instrument(skip_all, fields(tool = %request.name))]
    pub async fn call_tool(
        &self,
        mut request: CallToolRequestParam,
    ) -> Result<CallToolResult, McpError> {
        let separator = self.registry.separator();
        let (server, true_name) = separator.parse(&request.name)?;
        debug!(server, tool = true_name, "Routing tool call");

        let entry = self
            .registry
            .lookup(&request.name)
            .ok_or_else(|| ToolError::not_found(request.name.to_string()))?;

        request.name = entry.true_name.clone().into();

        match entry.connection.call_tool(request).await {
            Ok(result) => Ok(result),
            Err(ForwardError::Child(err)) => Err(err),
            Err(ForwardError::Transport(msg)) => {
                warn!(server = %entry.server, error = %msg, "Tool call failed in transport");
                Err(ToolError::transport(msg).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::connection::ToolConnection;
    use crate::domains::tools::namespace::Separator;
    use crate::domains::tools::test_support::{connection, tool};
    use async_trait::async_trait;
    use rmcp::model::{Content, ErrorCode, RawContent};
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every forwarded request and answers with a fixed outcome.
    struct RecordingConnection {
        calls: Mutex<Vec<CallToolRequestParam>>,
        outcome: fn() -> Result<CallToolResult, ForwardError>,
    }

    impl RecordingConnection {
        fn new(outcome: fn() -> Result<CallToolResult, ForwardError>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                outcome,
            })
        }

        fn calls(&self) -> Vec<CallToolRequestParam> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ToolConnection for RecordingConnection {
        async fn list_tools(&self) -> Result<Vec<Tool>, ForwardError> {
            Ok(Vec::new())
        }

        async fn call_tool(
            &self,
            request: CallToolRequestParam,
        ) -> Result<CallToolResult, ForwardError> {
            self.calls.lock().unwrap().push(request);
            (self.outcome)()
        }
    }

    fn ok_result() -> Result<CallToolResult, ForwardError> {
        Ok(CallToolResult::success(vec![Content::text("done")]))
    }

    fn request(name: &str, arguments: serde_json::Value) -> CallToolRequestParam {
        serde_json::from_value(json!({ "name": name, "arguments": arguments })).unwrap()
    }

    fn router_with(
        separator: &str,
        server: &str,
        names: &[&str],
        conn: Arc<dyn ToolConnection>,
    ) -> NamespaceRouter {
        let registry = Arc::new(CapabilityRegistry::new(Separator::new(separator).unwrap()));
        registry.add_child(server, conn, names.iter().map(|n| tool(n)).collect());
        NamespaceRouter::new(registry)
    }

    #[tokio::test]
    async fn test_forwards_true_name_and_arguments_unmodified() {
        let conn = RecordingConnection::new(ok_result);
        let router = router_with("__", "github", &["create_issue"], conn.clone());

        let result = router
            .call_tool(request("github__create_issue", json!({ "title": "x" })))
            .await
            .unwrap();

        match &result.content[0].raw {
            RawContent::Text(text) => assert_eq!(text.text, "done"),
            _ => panic!("Expected text content"),
        }

        let calls = conn.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "create_issue");
        assert_eq!(
            calls[0].arguments,
            json!({ "title": "x" }).as_object().cloned()
        );
    }

    #[tokio::test]
    async fn test_wrong_separator_is_malformed() {
        let conn = RecordingConnection::new(ok_result);
        let router = router_with("__", "github", &["create_issue"], conn.clone());

        let err = router
            .call_tool(request("github:create_issue", json!({})))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("github:create_issue"));
        assert!(err.message.contains("__"));
        assert!(conn.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_names_are_rejected() {
        let conn = RecordingConnection::new(ok_result);
        let router = router_with(":", "fs", &["read"], conn.clone());

        for name in ["read", ":read", "fs:", ":", "::"] {
            let err = router.call_tool(request(name, json!({}))).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::INVALID_PARAMS, "name: {name}");
        }
        assert!(conn.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found_without_contacting_children() {
        let conn = RecordingConnection::new(ok_result);
        let router = router_with("__", "github", &["create_issue"], conn.clone());

        let err = router
            .call_tool(request("nonexistent__tool", json!({})))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::METHOD_NOT_FOUND);
        assert!(err.message.contains("nonexistent__tool"));
        assert!(conn.calls().is_empty());
    }

    #[tokio::test]
    async fn test_tool_name_with_separator_routes_by_full_name() {
        let conn = RecordingConnection::new(ok_result);
        let router = router_with(":", "fs", &["dir:list"], conn.clone());

        router.call_tool(request("fs:dir:list", json!({}))).await.unwrap();
        assert_eq!(conn.calls()[0].name, "dir:list");
    }

    #[tokio::test]
    async fn test_child_error_is_forwarded_verbatim() {
        fn child_error() -> Result<CallToolResult, ForwardError> {
            Err(ForwardError::Child(McpError::invalid_params(
                "missing field `title`",
                Some(json!({ "field": "title" })),
            )))
        }
        let router = router_with("__", "github", &["create_issue"], RecordingConnection::new(child_error));

        let err = router
            .call_tool(request("github__create_issue", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(err.message, "missing field `title`");
        assert_eq!(err.data, Some(json!({ "field": "title" })));
    }

    #[tokio::test]
    async fn test_child_tool_failure_result_is_forwarded() {
        fn tool_failure() -> Result<CallToolResult, ForwardError> {
            Ok(CallToolResult::error(vec![Content::text("issue tracker offline")]))
        }
        let router = router_with("__", "github", &["create_issue"], RecordingConnection::new(tool_failure));

        let result = router
            .call_tool(request("github__create_issue", json!({})))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_internal_error() {
        fn closed() -> Result<CallToolResult, ForwardError> {
            Err(ForwardError::Transport("Transport closed".to_string()))
        }
        let router = router_with("__", "github", &["create_issue"], RecordingConnection::new(closed));

        let err = router
            .call_tool(request("github__create_issue", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
        assert!(err.message.contains("Transport closed"));
    }

    #[test]
    fn test_list_tools_empty_registry() {
        let registry = Arc::new(CapabilityRegistry::new(Separator::default()));
        let router = NamespaceRouter::new(registry);
        assert!(router.list_tools().is_empty());
    }

    #[test]
    fn test_list_tools_reflects_registry() {
        let router = router_with(":", "a", &["x", "y"], connection(&["x", "y"]));
        let mut names: Vec<_> = router
            .list_tools()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a:x", "a:y"]);

        router.registry().remove_child("a");
        assert!(router.list_tools().is_empty());
    }
}
