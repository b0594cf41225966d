//! Physical names: the externally visible name of a resource.
//!
//! A resource's physical name is either pinned by the caller or left for
//! the provisioning engine to assign at creation time. Reading an
//! auto-assigned name before deployment yields a deferred reference to the
//! owning construct; reading a pinned name always yields the literal.

use crate::tree::NodeId;
use crate::value::PropValue;

/// A resource's externally visible name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PhysicalName {
    /// Let the provisioning engine assign a name at creation time.
    #[default]
    Auto,
    /// A caller-supplied literal name.
    Named(String),
}

impl PhysicalName {
    /// An auto-assigned name.
    pub fn auto() -> Self {
        PhysicalName::Auto
    }

    /// A pinned literal name.
    pub fn named(name: impl Into<String>) -> Self {
        PhysicalName::Named(name.into())
    }

    /// Whether the name is assigned by the provisioning engine.
    pub fn is_auto(&self) -> bool {
        matches!(self, PhysicalName::Auto)
    }

    /// The pinned name, if one was supplied.
    pub fn as_named(&self) -> Option<&str> {
        match self {
            PhysicalName::Auto => None,
            PhysicalName::Named(name) => Some(name),
        }
    }

    /// Read the name as a property value for the resource owned by `owner`.
    ///
    /// Pinned names resolve to the literal string, never wrapped in a
    /// reference expression. Auto names resolve to a deferred reference to
    /// the owning construct; repeated reads return structurally equal
    /// values bound to the same owner.
    pub fn resolve(&self, owner: NodeId) -> PropValue {
        match self {
            PhysicalName::Auto => PropValue::Ref(owner),
            PhysicalName::Named(name) => PropValue::string(name.clone()),
        }
    }
}
