//! The construct tree: an arena of named nodes with scoped lookup.
//!
//! Application code builds the tree top-down by adding named children under
//! existing scopes, then binds resource kinds to the nodes that represent
//! deployable resources. The tree is built once per synthesis pass and is
//! never mutated concurrently.
//!
//! Nodes are owned by an arena and addressed through copyable [`NodeId`]
//! handles. Parent links are handles too, used only for lookup, so the
//! parent/child back-references cannot form an ownership cycle.

use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::resource::ResourceKind;

/// Handle addressing a node inside a [`ConstructTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single node in the construct tree.
pub struct ConstructNode {
    local_name: String,
    parent: Option<NodeId>,
    children: IndexMap<String, NodeId>,
    kind: Option<Box<dyn ResourceKind>>,
    detached: bool,
}

impl ConstructNode {
    fn new(local_name: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            local_name: local_name.into(),
            parent,
            children: IndexMap::new(),
            kind: None,
            detached: false,
        }
    }

    /// The node's name, unique among its siblings.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Handle of the parent node; `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child handles keyed by local name, in insertion order.
    pub fn children(&self) -> &IndexMap<String, NodeId> {
        &self.children
    }

    /// The resource kind bound to this node, if any.
    pub fn kind(&self) -> Option<&dyn ResourceKind> {
        self.kind.as_deref()
    }

    /// Whether the node has been detached from the tree.
    pub fn is_detached(&self) -> bool {
        self.detached
    }
}

impl fmt::Debug for ConstructNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructNode")
            .field("local_name", &self.local_name)
            .field("parent", &self.parent)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("kind", &self.kind.as_ref().map(|k| k.kind().to_string()))
            .field("detached", &self.detached)
            .finish()
    }
}

/// Arena-owned tree of construct nodes.
///
/// The tree owns every node; handles stay valid for the lifetime of the
/// tree. Detaching a subtree tombstones its nodes rather than reusing the
/// slots, so a stale handle can never silently address a different node.
pub struct ConstructTree {
    nodes: Vec<ConstructNode>,
}

impl ConstructTree {
    /// Create a tree containing only the root node (path `""`).
    pub fn new() -> Self {
        Self {
            nodes: vec![ConstructNode::new("", None)],
        }
    }

    /// Handle of the root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Add a named child under `parent`.
    ///
    /// Fails with [`CoreError::DuplicateName`] if the parent already has a
    /// child with that name, and with [`CoreError::InvalidName`] if the
    /// name is empty.
    pub fn add_child(&mut self, parent: NodeId, local_name: impl Into<String>) -> CoreResult<NodeId> {
        let local_name = local_name.into();
        if local_name.is_empty() {
            return Err(CoreError::InvalidName(local_name));
        }
        let parent_path = self.path(parent)?;
        if self.nodes[parent.0].detached {
            return Err(CoreError::NodeNotFound(format!(
                "cannot add '{local_name}' under detached construct '{parent_path}'"
            )));
        }
        if self.nodes[parent.0].children.contains_key(&local_name) {
            return Err(CoreError::DuplicateName {
                parent_path,
                name: local_name,
            });
        }

        let id = NodeId(self.nodes.len());
        debug!("Adding construct '{}' under '{}'", local_name, parent_path);
        self.nodes.push(ConstructNode::new(local_name.clone(), Some(parent)));
        self.nodes[parent.0].children.insert(local_name, id);
        Ok(id)
    }

    /// Bind a resource kind to an existing node.
    ///
    /// Binding after construction allows two resources to hold references
    /// to each other regardless of declaration order. Fails with
    /// [`CoreError::KindAlreadyBound`] if the node already has a kind.
    pub fn attach(&mut self, node: NodeId, kind: Box<dyn ResourceKind>) -> CoreResult<()> {
        let path = self.path(node)?;
        if self.nodes[node.0].kind.is_some() {
            return Err(CoreError::KindAlreadyBound(path));
        }
        debug!("Binding resource kind '{}' to '{}'", kind.kind(), path);
        self.nodes[node.0].kind = Some(kind);
        Ok(())
    }

    /// Add a named child under `parent` and bind a resource kind to it.
    pub fn add_resource(
        &mut self,
        parent: NodeId,
        local_name: impl Into<String>,
        kind: Box<dyn ResourceKind>,
    ) -> CoreResult<NodeId> {
        let id = self.add_child(parent, local_name)?;
        self.attach(id, kind)?;
        Ok(id)
    }

    /// Look up a direct child of `parent` by local name.
    pub fn find_child(&self, parent: NodeId, local_name: &str) -> Option<NodeId> {
        let node = self.nodes.get(parent.0)?;
        node.children.get(local_name).copied()
    }

    /// Look up a descendant of `from` by a `/`-separated relative path.
    pub fn find_descendant(&self, from: NodeId, relative_path: &str) -> Option<NodeId> {
        let mut current = from;
        for segment in relative_path.split('/').filter(|s| !s.is_empty()) {
            current = self.find_child(current, segment)?;
        }
        Some(current)
    }

    /// Borrow a node by handle.
    ///
    /// Succeeds for detached nodes too; use [`ConstructTree::contains`] to
    /// test liveness.
    pub fn get(&self, node: NodeId) -> CoreResult<&ConstructNode> {
        self.nodes
            .get(node.0)
            .ok_or_else(|| CoreError::NodeNotFound(node.to_string()))
    }

    /// The resource kind bound to `node`, if the node exists and has one.
    pub fn kind(&self, node: NodeId) -> Option<&dyn ResourceKind> {
        self.nodes.get(node.0).and_then(|n| n.kind())
    }

    /// Whether `node` is a live (attached) member of this tree.
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.get(node.0).is_some_and(|n| !n.detached)
    }

    /// The node's full path, computed from the parent chain on every call.
    ///
    /// The root's path is `""`; a nested node's path joins the local names
    /// from the root down with `/`.
    pub fn path(&self, node: NodeId) -> CoreResult<String> {
        Ok(self.path_components(node)?.join("/"))
    }

    /// The local names along the path from the root down to `node`,
    /// excluding the root's empty name.
    pub fn path_components(&self, node: NodeId) -> CoreResult<Vec<String>> {
        let mut components = Vec::new();
        let mut current = self.get(node)?;
        loop {
            match current.parent {
                Some(parent) => {
                    components.push(current.local_name.clone());
                    current = self.get(parent)?;
                }
                None => break,
            }
        }
        components.reverse();
        Ok(components)
    }

    /// Handles of all live nodes in post-order: children before their
    /// parent, siblings in insertion order, the root last.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        self.collect_post_order(self.root(), &mut order);
        order
    }

    fn collect_post_order(&self, node: NodeId, order: &mut Vec<NodeId>) {
        for child in self.nodes[node.0].children.values() {
            self.collect_post_order(*child, order);
        }
        order.push(node);
    }

    /// Visit every live node in post-order.
    pub fn walk_post_order(&self, mut visitor: impl FnMut(NodeId, &ConstructNode)) {
        for id in self.post_order() {
            visitor(id, &self.nodes[id.0]);
        }
    }

    /// Detach the child subtree named `local_name` under `parent`.
    ///
    /// The subtree is removed from every walk; tokens that still reference
    /// its nodes become unresolvable at synthesis time. Returns the handle
    /// of the detached child.
    pub fn detach_child(&mut self, parent: NodeId, local_name: &str) -> CoreResult<NodeId> {
        let parent_path = self.path(parent)?;
        let child = self.nodes[parent.0]
            .children
            .shift_remove(local_name)
            .ok_or_else(|| {
                CoreError::NodeNotFound(format!("no child named '{local_name}' under '{parent_path}'"))
            })?;
        debug!("Detaching construct '{}' under '{}'", local_name, parent_path);
        self.mark_detached(child);
        Ok(child)
    }

    fn mark_detached(&mut self, node: NodeId) {
        self.nodes[node.0].detached = true;
        let children: Vec<NodeId> = self.nodes[node.0].children.values().copied().collect();
        for child in children {
            self.mark_detached(child);
        }
    }

    /// Number of live nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| !n.detached).count()
    }

    /// Whether the tree has no live nodes (never true: the root is always live).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ConstructTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConstructTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<String> = self
            .post_order()
            .iter()
            .filter_map(|id| self.path(*id).ok())
            .collect();
        f.debug_struct("ConstructTree").field("nodes", &paths).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::GenericResource;

    #[test]
    fn test_root_path_is_empty() {
        let tree = ConstructTree::new();
        assert_eq!(tree.path(tree.root()).unwrap(), "");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_add_child_builds_paths() {
        let mut tree = ConstructTree::new();
        let api = tree.add_child(tree.root(), "Api").unwrap();
        let route = tree.add_child(api, "DefaultRoute").unwrap();

        assert_eq!(tree.path(api).unwrap(), "Api");
        assert_eq!(tree.path(route).unwrap(), "Api/DefaultRoute");
        assert_eq!(
            tree.path_components(route).unwrap(),
            vec!["Api".to_string(), "DefaultRoute".to_string()]
        );
    }

    #[test]
    fn test_duplicate_sibling_name_rejected() {
        let mut tree = ConstructTree::new();
        let api = tree.add_child(tree.root(), "Api").unwrap();
        tree.add_child(api, "Route").unwrap();

        let err = tree.add_child(api, "Route").unwrap_err();
        assert!(matches!(err, CoreError::DuplicateName { .. }));
        // Same name under a different parent is fine.
        let other = tree.add_child(tree.root(), "Other").unwrap();
        assert!(tree.add_child(other, "Route").is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut tree = ConstructTree::new();
        let err = tree.add_child(tree.root(), "").unwrap_err();
        assert!(matches!(err, CoreError::InvalidName(_)));
    }

    #[test]
    fn test_find_child_and_descendant() {
        let mut tree = ConstructTree::new();
        let api = tree.add_child(tree.root(), "Api").unwrap();
        let route = tree.add_child(api, "Route").unwrap();

        assert_eq!(tree.find_child(tree.root(), "Api"), Some(api));
        assert_eq!(tree.find_child(api, "Missing"), None);
        assert_eq!(tree.find_descendant(tree.root(), "Api/Route"), Some(route));
        assert_eq!(tree.find_descendant(tree.root(), "Api/Nope"), None);
    }

    #[test]
    fn test_post_order_children_first() {
        let mut tree = ConstructTree::new();
        let a = tree.add_child(tree.root(), "A").unwrap();
        let a1 = tree.add_child(a, "A1").unwrap();
        let a2 = tree.add_child(a, "A2").unwrap();
        let b = tree.add_child(tree.root(), "B").unwrap();

        assert_eq!(tree.post_order(), vec![a1, a2, a, b, tree.root()]);
    }

    #[test]
    fn test_attach_twice_rejected() {
        let mut tree = ConstructTree::new();
        let svc = tree.add_child(tree.root(), "Service").unwrap();
        tree.attach(svc, Box::new(GenericResource::new("container/service")))
            .unwrap();

        let err = tree
            .attach(svc, Box::new(GenericResource::new("container/service")))
            .unwrap_err();
        assert!(matches!(err, CoreError::KindAlreadyBound(_)));
    }

    #[test]
    fn test_detach_child_removes_subtree() {
        let mut tree = ConstructTree::new();
        let api = tree.add_child(tree.root(), "Api").unwrap();
        let route = tree.add_child(api, "Route").unwrap();

        let detached = tree.detach_child(tree.root(), "Api").unwrap();
        assert_eq!(detached, api);
        assert!(!tree.contains(api));
        assert!(!tree.contains(route));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.find_child(tree.root(), "Api"), None);
        assert!(!tree.post_order().contains(&route));
        // The name becomes free again.
        assert!(tree.add_child(tree.root(), "Api").is_ok());
    }

    #[test]
    fn test_detach_missing_child_fails() {
        let mut tree = ConstructTree::new();
        let err = tree.detach_child(tree.root(), "Ghost").unwrap_err();
        assert!(matches!(err, CoreError::NodeNotFound(_)));
    }
}
