//! Capability Registry - the merged, namespaced tool catalog.
//!
//! This module provides:
//! - Bulk registration of one child's catalog under its namespace
//! - Bulk removal of a child's tools when it goes away
//! - O(1) lookup of a namespaced tool name for routing
//! - A snapshot of every announced tool for `tools/list`
//!
//! Every mutation happens under a single write lock, so a reader never sees a
//! partially added or partially removed child.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use rmcp::model::Tool;
use tracing::{info, warn};

use super::connection::ToolConnection;
use super::namespace::Separator;

// ============================================================================
// Registry Entry
// ============================================================================

/// Routing metadata for one namespaced tool.
pub struct RegistryEntry {
    /// Key of the child that owns the tool.
    pub server: String,

    /// The tool's name as reported by the child.
    pub true_name: String,

    /// The tool descriptor, with `name` rewritten to the namespaced form.
    pub tool: Tool,

    /// Session with the owning child.
    pub connection: Arc<dyn ToolConnection>,
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("server", &self.server)
            .field("true_name", &self.true_name)
            .field("name", &self.tool.name)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Capability Registry
// ============================================================================

/// Namespaced name -> routing entry, for every tool of every live child.
pub struct CapabilityRegistry {
    separator: Separator,
    entries: RwLock<HashMap<String, Arc<RegistryEntry>>>,
}

impl CapabilityRegistry {
    /// Create an empty registry using the given separator.
    pub fn new(separator: Separator) -> Self {
        Self {
            separator,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The separator used to build every key in this registry.
    pub fn separator(&self) -> &Separator {
        &self.separator
    }

    /// Register a child's whole catalog under `server`.
    ///
    /// Replaces whatever `server` announced before. If the child reports the
    /// same tool name twice, the last one wins. Returns the number of entries
    /// inserted.
    pub fn add_child(
        &self,
        server: &str,
        connection: Arc<dyn ToolConnection>,
        tools: Vec<Tool>,
    ) -> usize {
        let mut staged: HashMap<String, Arc<RegistryEntry>> = HashMap::with_capacity(tools.len());

        for mut tool in tools {
            let true_name = tool.name.to_string();
            let namespaced = self.separator.join(server, &true_name);
            tool.name = namespaced.clone().into();

            let entry = Arc::new(RegistryEntry {
                server: server.to_string(),
                true_name,
                tool,
                connection: Arc::clone(&connection),
            });

            if staged.insert(namespaced.clone(), entry).is_some() {
                warn!(server, tool = %namespaced, "Duplicate tool name reported by child; keeping the last one");
            }
        }

        let count = staged.len();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, entry| entry.server != server);
        entries.extend(staged);
        drop(entries);

        info!(server, count, "Registered child tools");
        count
    }

    /// Remove every tool owned by `server`.
    ///
    /// Unknown or already-removed children are a no-op. Returns the number of
    /// entries removed.
    pub fn remove_child(&self, server: &str) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.server != server);
        let removed = before - entries.len();
        drop(entries);

        if removed > 0 {
            info!(server, removed, "Removed child tools");
        }
        removed
    }

    /// Look up a namespaced tool name.
    pub fn lookup(&self, name: &str) -> Option<Arc<RegistryEntry>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Snapshot of every registered tool descriptor. Order is unspecified.
    pub fn list_all(&self) -> Vec<Tool> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|entry| entry.tool.clone())
            .collect()
    }

    /// Get all registered namespaced names.
    pub fn tool_names(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
