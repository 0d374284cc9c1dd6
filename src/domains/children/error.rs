//! Child lifecycle error types.

use std::fmt;

use thiserror::Error;

/// Lifecycle phase in which a child failed to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildPhase {
    /// The process could not be spawned.
    Startup,

    /// The process started but the handshake or first catalog fetch failed.
    Initialization,
}

impl fmt::Display for ChildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => f.write_str("startup"),
            Self::Initialization => f.write_str("initialization"),
        }
    }
}

/// A child server failed to reach the ready state.
#[derive(Debug, Error)]
#[error("Child server '{key}' failed during {phase}: {cause}")]
pub struct ChildError {
    /// Configured key of the failing child.
    pub key: String,

    /// Phase that failed.
    pub phase: ChildPhase,

    /// Underlying cause, as reported by the process or protocol layer.
    pub cause: String,
}

impl ChildError {
    /// Create a spawn failure.
    pub fn startup(key: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self {
            key: key.into(),
            phase: ChildPhase::Startup,
            cause: cause.to_string(),
        }
    }

    /// Create a handshake or catalog failure.
    pub fn initialization(key: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self {
            key: key.into(),
            phase: ChildPhase::Initialization,
            cause: cause.to_string(),
        }
    }
}
