//! The resource capability interface.
//!
//! Concrete resource kinds (routes, services, clusters) live outside the
//! core; the tree and the synthesizer only ever see this trait. A kind
//! supplies its provider-facing property mapping and an optional
//! self-check, and new kinds are added by implementing the trait, never by
//! modifying the core.

use indexmap::IndexMap;

use crate::physical::PhysicalName;
use crate::value::PropValue;

/// Capability interface implemented by every resource kind.
///
/// Implementations must be pure with respect to the tree: `properties` and
/// `validate` may be called any number of times during a synthesis pass and
/// must return equivalent results each time.
pub trait ResourceKind: Send + Sync {
    /// The provider-facing type string (e.g. `"container/service"`).
    fn kind(&self) -> &str;

    /// The resource's externally visible name.
    ///
    /// Default: assigned by the provisioning engine at creation time.
    fn physical_name(&self) -> PhysicalName {
        PhysicalName::Auto
    }

    /// The provider property mapping, literal-or-deferred per value.
    fn properties(&self) -> IndexMap<String, PropValue>;

    /// Self-check hook; each returned string is one validation failure.
    ///
    /// Default: no failures.
    fn validate(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A property-bag resource for kinds with no dedicated implementation.
#[derive(Debug, Clone)]
pub struct GenericResource {
    kind: String,
    physical_name: PhysicalName,
    properties: IndexMap<String, PropValue>,
}

impl GenericResource {
    /// Create a resource of the given provider kind with no properties.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            physical_name: PhysicalName::Auto,
            properties: IndexMap::new(),
        }
    }

    /// Pin or defer the externally visible name.
    pub fn with_physical_name(mut self, name: PhysicalName) -> Self {
        self.physical_name = name;
        self
    }

    /// Set a provider property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

impl ResourceKind for GenericResource {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn physical_name(&self) -> PhysicalName {
        self.physical_name.clone()
    }

    fn properties(&self) -> IndexMap<String, PropValue> {
        self.properties.clone()
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.kind.trim().is_empty() {
            errors.push("resource kind string cannot be empty".to_string());
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_resource_builder() {
        let resource = GenericResource::new("container/service")
            .with_physical_name(PhysicalName::named("my-service"))
            .with_property("replicas", 3)
            .with_property("image", "registry/app:latest");

        assert_eq!(resource.kind(), "container/service");
        assert_eq!(resource.physical_name().as_named(), Some("my-service"));

        let props = resource.properties();
        assert_eq!(props.len(), 2);
        // Insertion order is preserved.
        assert_eq!(
            props.keys().collect::<Vec<_>>(),
            vec!["replicas", "image"]
        );
        assert!(resource.validate().is_empty());
    }

    #[test]
    fn test_empty_kind_fails_self_check() {
        let resource = GenericResource::new("  ");
        assert_eq!(resource.validate().len(), 1);
    }
}
