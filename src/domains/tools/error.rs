//! Tool-specific error types.

use rmcp::{ErrorData as McpError, model::ErrorCode};
use thiserror::Error;

/// Errors that can occur while naming or routing tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The namespace separator failed validation.
    #[error("Invalid namespace separator {0:?}: must be non-empty and contain no whitespace")]
    InvalidSeparator(String),

    /// The tool name could not be split into a namespace and a tool name.
    #[error(
        "Malformed tool name '{name}': expected '<server>{separator}<tool>' with a non-empty server and tool"
    )]
    MalformedName { name: String, separator: String },

    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The connection to the owning child failed.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ToolError {
    /// Create a new "invalid separator" error.
    pub fn invalid_separator(separator: impl Into<String>) -> Self {
        Self::InvalidSeparator(separator.into())
    }

    /// Create a new "malformed name" error.
    pub fn malformed(name: impl Into<String>, separator: impl Into<String>) -> Self {
        Self::MalformedName {
            name: name.into(),
            separator: separator.into(),
        }
    }

    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "transport" error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let message = err.to_string();
        match err {
            ToolError::MalformedName { .. } | ToolError::InvalidSeparator(_) => {
                McpError::invalid_params(message, None)
            }
            ToolError::NotFound(_) => McpError::new(ErrorCode::METHOD_NOT_FOUND, message, None),
            ToolError::Transport(_) => McpError::internal_error(message, None),
        }
    }
}
