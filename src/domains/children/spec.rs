//! Static child server specifications.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How to launch one child server: executable, arguments and an environment
/// overlay applied on top of the aggregator's own environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildSpec {
    /// Executable path or name.
    pub command: String,

    /// Command-line arguments.
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment variables set for the child, winning over inherited ones.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl ChildSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// The configured children, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetSpec {
    children: Vec<(String, ChildSpec)>,
}

impl FleetSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child. A key that is already present is replaced in place.
    pub fn insert(&mut self, key: impl Into<String>, spec: ChildSpec) {
        let key = key.into();
        match self.children.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = spec,
            None => self.children.push((key, spec)),
        }
    }

    pub fn with_child(mut self, key: impl Into<String>, spec: ChildSpec) -> Self {
        self.insert(key, spec);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ChildSpec> {
        self.children
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, spec)| spec)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChildSpec)> {
        self.children.iter().map(|(key, spec)| (key.as_str(), spec))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
