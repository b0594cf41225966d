//! The synthesis pass.
//!
//! Synthesis turns a validated construct tree into the flat deployment
//! document: validation first, then logical id allocation and token
//! resolution per resource, all in one synchronous post-order walk.
//! A failing step aborts the whole pass; partial documents are never
//! returned.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, info};

use trellis_core::{ConstructTree, IdAllocator, NodeId, PhysicalName, PropValue};

use crate::document::{OutputDocument, ResourceEntry};
use crate::error::{SynthError, SynthResult};
use crate::resolver::TokenResolver;
use crate::validator::TreeValidator;

/// Synthesizes deployment documents from construct trees.
pub struct Synthesizer;

impl Synthesizer {
    /// Synthesize the tree into a deployment document.
    ///
    /// Refuses to proceed if any resource self-check fails, returning the
    /// complete validation report. Every deferred value is reduced to a
    /// literal or a reference expression; resolution failures (cycles,
    /// unresolvable tokens, id collisions) abort the pass.
    pub fn synthesize(tree: &ConstructTree) -> SynthResult<OutputDocument> {
        let report = TreeValidator::validate(tree);
        if !report.is_empty() {
            return Err(SynthError::Validation(report));
        }

        let order = tree.post_order();
        let emitted = Self::collect_emitted(tree, &order);
        let resolver = TokenResolver::new(tree, &emitted);

        let mut document = OutputDocument::new();
        let mut id_owners: HashMap<String, String> = HashMap::new();
        for node in order {
            let Some(kind) = tree.kind(node) else { continue };
            let path = tree.path(node)?;
            let logical_id = IdAllocator::allocate(&tree.path_components(node)?)?;
            if let Some(first) = id_owners.get(&logical_id) {
                return Err(SynthError::DuplicateLogicalId {
                    id: logical_id,
                    first: first.clone(),
                    second: path,
                });
            }
            debug!("Resolving resource '{}' as '{}'", path, logical_id);

            let mut properties = IndexMap::new();
            if let Some(props) = emitted.get(&node) {
                for (name, value) in props {
                    properties.insert(name.clone(), resolver.resolve_property(node, name, value)?);
                }
            }

            id_owners.insert(logical_id.clone(), path);
            document.insert(
                logical_id,
                ResourceEntry {
                    kind: kind.kind().to_string(),
                    properties,
                },
            );
        }

        info!("Synthesized {} resource(s)", document.len());
        Ok(document)
    }

    /// Synthesize and write the document into `dir`.
    pub fn synthesize_to(tree: &ConstructTree, dir: &Path) -> SynthResult<OutputDocument> {
        let document = Self::synthesize(tree)?;
        document.write_to(dir)?;
        Ok(document)
    }

    /// Collect each resource node's property mapping for this pass.
    ///
    /// A pinned physical name is emitted as the resource's `name` property
    /// unless the resource already emits one; an auto-assigned name emits
    /// nothing.
    fn collect_emitted(
        tree: &ConstructTree,
        order: &[NodeId],
    ) -> HashMap<NodeId, IndexMap<String, PropValue>> {
        let mut emitted = HashMap::new();
        for node in order {
            let Some(kind) = tree.kind(*node) else { continue };
            let mut props = kind.properties();
            if let PhysicalName::Named(name) = kind.physical_name() {
                props
                    .entry("name".to_string())
                    .or_insert_with(|| PropValue::string(name));
            }
            emitted.insert(*node, props);
        }
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use trellis_core::{GenericResource, ResourceKind};

    struct BrokenResource;

    impl ResourceKind for BrokenResource {
        fn kind(&self) -> &str {
            "test/broken"
        }

        fn properties(&self) -> IndexMap<String, PropValue> {
            IndexMap::new()
        }

        fn validate(&self) -> Vec<String> {
            vec!["intentionally broken".to_string()]
        }
    }

    #[test]
    fn test_validation_failure_refuses_synthesis() {
        let mut tree = ConstructTree::new();
        tree.add_resource(tree.root(), "Broken", Box::new(BrokenResource)).unwrap();

        let err = Synthesizer::synthesize(&tree).unwrap_err();
        match err {
            SynthError::Validation(report) => {
                assert_eq!(report.error_count(), 1);
                assert!(report.messages("Broken").is_some());
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_pinned_physical_name_becomes_name_property() {
        let mut tree = ConstructTree::new();
        tree.add_resource(
            tree.root(),
            "Service",
            Box::new(
                GenericResource::new("container/service")
                    .with_physical_name(PhysicalName::named("my-service")),
            ),
        )
        .unwrap();

        let document = Synthesizer::synthesize(&tree).unwrap();
        let entry = document.get("Service").unwrap();
        assert_eq!(entry.properties["name"].as_str(), Some("my-service"));
    }

    #[test]
    fn test_auto_physical_name_emits_nothing() {
        let mut tree = ConstructTree::new();
        tree.add_resource(
            tree.root(),
            "Service",
            Box::new(GenericResource::new("container/service")),
        )
        .unwrap();

        let document = Synthesizer::synthesize(&tree).unwrap();
        let entry = document.get("Service").unwrap();
        assert!(!entry.properties.contains_key("name"));
    }

    #[test]
    fn test_explicit_name_property_wins_over_pinned_name() {
        let mut tree = ConstructTree::new();
        tree.add_resource(
            tree.root(),
            "Service",
            Box::new(
                GenericResource::new("container/service")
                    .with_physical_name(PhysicalName::named("pinned"))
                    .with_property("name", "explicit"),
            ),
        )
        .unwrap();

        let document = Synthesizer::synthesize(&tree).unwrap();
        let entry = document.get("Service").unwrap();
        assert_eq!(entry.properties["name"].as_str(), Some("explicit"));
    }

    #[test]
    fn test_repeated_synthesis_is_identical() {
        let mut tree = ConstructTree::new();
        let cluster = tree
            .add_resource(
                tree.root(),
                "Cluster",
                Box::new(GenericResource::new("container/cluster")),
            )
            .unwrap();
        tree.add_resource(
            tree.root(),
            "Service",
            Box::new(
                GenericResource::new("container/service")
                    .with_property("cluster", PropValue::Ref(cluster)),
            ),
        )
        .unwrap();

        let first = Synthesizer::synthesize(&tree).unwrap();
        let second = Synthesizer::synthesize(&tree).unwrap();
        assert_eq!(first, second);
    }
}
