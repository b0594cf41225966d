//! Scope-keyed construct registry.
//!
//! Composite builders often want "one shared instance per scope" semantics,
//! e.g. a default cluster created on first use and reused by every service
//! in the same scope. The registry makes that explicit and scoped to a
//! single synthesis pass instead of hiding it behind process-wide state.

use std::collections::HashMap;

use tracing::debug;

use crate::error::CoreResult;
use crate::tree::NodeId;

/// A registry of shared constructs keyed by cache key.
///
/// Create one per synthesis pass and thread it through the builders that
/// need shared instances; independent passes never observe each other's
/// entries.
#[derive(Debug, Default)]
pub struct ScopeRegistry {
    entries: HashMap<String, NodeId>,
}

impl ScopeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Get the construct registered under `key`.
    pub fn get(&self, key: &str) -> Option<NodeId> {
        self.entries.get(key).copied()
    }

    /// Get the construct registered under `key`, creating and registering
    /// it with `create` on first use.
    pub fn get_or_create<F>(&mut self, key: impl Into<String>, create: F) -> CoreResult<NodeId>
    where
        F: FnOnce() -> CoreResult<NodeId>,
    {
        let key = key.into();
        if let Some(existing) = self.entries.get(&key) {
            return Ok(*existing);
        }
        let node = create()?;
        debug!("Registering shared construct under key '{}'", key);
        self.entries.insert(key, node);
        Ok(node)
    }

    /// Register a construct under `key`, replacing any previous entry.
    pub fn insert(&mut self, key: impl Into<String>, node: NodeId) {
        self.entries.insert(key.into(), node);
    }

    /// Check if a construct is registered under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of registered constructs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ConstructTree;

    #[test]
    fn test_get_or_create_creates_once() {
        let mut tree = ConstructTree::new();
        let root = tree.root();
        let mut registry = ScopeRegistry::new();

        let first = registry
            .get_or_create("default-cluster", || tree.add_child(root, "DefaultCluster"))
            .unwrap();
        let second = registry
            .get_or_create("default-cluster", || {
                panic!("create must not run for a cached key")
            })
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_creation_failure_registers_nothing() {
        let mut registry = ScopeRegistry::new();
        let result = registry.get_or_create("broken", || {
            Err(crate::error::CoreError::EmptyPath)
        });

        assert!(result.is_err());
        assert!(!registry.contains("broken"));
        assert!(registry.is_empty());
    }
}
