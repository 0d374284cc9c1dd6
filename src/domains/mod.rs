//! Domains module containing business logic organized by bounded contexts.
//!
//! - **children**: starting, supervising and stopping child MCP servers
//! - **tools**: the namespaced catalog and routing of tool calls

pub mod children;
pub mod tools;
