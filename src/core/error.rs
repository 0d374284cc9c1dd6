//! Error types and handling for the aggregator.
//!
//! This module defines a unified error type that can represent errors from
//! all domains and the transport, providing consistent error handling across
//! the entire application.

use thiserror::Error;

use super::transport::TransportError;
use crate::domains::children::ChildError;
use crate::domains::tools::ToolError;

/// A specialized Result type for aggregator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the aggregator.
///
/// Tool errors are normally turned into protocol errors at the router; they
/// only reach this type when they surface outside a request.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the tools domain, such as an invalid separator.
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// A child server failed to start.
    #[error(transparent)]
    Child(#[from] ChildError),

    /// The client-facing transport failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
