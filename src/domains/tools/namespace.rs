//! Namespaced tool names.
//!
//! Every tool exposed by the aggregator is named `<server><separator><tool>`,
//! where `<server>` is the configured key of the child that owns it. The
//! separator is fixed for the lifetime of one running instance and is used
//! identically to build and to parse names.

use std::fmt;
use std::str::FromStr;

use super::ToolError;

/// Separator used when none is configured.
pub const DEFAULT_SEPARATOR: &str = ":";

/// A validated namespace separator: non-empty, no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Separator(String);

impl Separator {
    /// Validate and wrap a separator string.
    pub fn new(separator: impl Into<String>) -> Result<Self, ToolError> {
        let separator = separator.into();
        if separator.is_empty() || separator.chars().any(char::is_whitespace) {
            return Err(ToolError::invalid_separator(separator));
        }
        Ok(Self(separator))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the namespaced name for a child's tool.
    ///
    /// Plain concatenation: a tool name that itself contains the separator is
    /// kept verbatim.
    pub fn join(&self, server: &str, tool: &str) -> String {
        let mut name = String::with_capacity(server.len() + self.0.len() + tool.len());
        name.push_str(server);
        name.push_str(&self.0);
        name.push_str(tool);
        name
    }

    /// Split a namespaced name at the first occurrence of the separator.
    ///
    /// Returns `(server, tool)` only when both halves are non-empty.
    pub fn split<'a>(&self, name: &'a str) -> Option<(&'a str, &'a str)> {
        let index = name.find(self.0.as_str())?;
        let server = &name[..index];
        let tool = &name[index + self.0.len()..];
        if server.is_empty() || tool.is_empty() {
            return None;
        }
        Some((server, tool))
    }

    /// Like [`Separator::split`], but reports a malformed name as an error.
    pub fn parse<'a>(&self, name: &'a str) -> Result<(&'a str, &'a str), ToolError> {
        self.split(name)
            .ok_or_else(|| ToolError::malformed(name, self.0.as_str()))
    }
}

impl Default for Separator {
    fn default() -> Self {
        Self(DEFAULT_SEPARATOR.to_string())
    }
}

impl FromStr for Separator {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
