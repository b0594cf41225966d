//! Deferred property values.
//!
//! A [`PropValue`] is either a concrete JSON literal or a placeholder for a
//! value that only exists once the external provisioning engine has created
//! the referenced resource. Placeholders are immutable once built, and
//! composite values keep their constituent parts unevaluated until the
//! synthesizer resolves the whole tree.

use indexmap::IndexMap;
use serde_json::Value;

use crate::tree::NodeId;

/// A literal-or-deferred property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// A concrete JSON value.
    Literal(Value),
    /// The runtime identity of another construct (resolved to a reference
    /// expression on its logical id).
    Ref(NodeId),
    /// A named runtime attribute of another construct.
    Attr { target: NodeId, attribute: String },
    /// String concatenation over literal and deferred parts.
    Join(Vec<PropValue>),
    /// An ordered list; elements are resolved independently.
    List(Vec<PropValue>),
    /// A nested property mapping; values may themselves be deferred.
    Map(IndexMap<String, PropValue>),
}

impl PropValue {
    /// A literal string value.
    pub fn string(value: impl Into<String>) -> Self {
        PropValue::Literal(Value::String(value.into()))
    }

    /// A reference to a named attribute of `target`.
    pub fn attr(target: NodeId, attribute: impl Into<String>) -> Self {
        PropValue::Attr {
            target,
            attribute: attribute.into(),
        }
    }

    /// A string concatenation over the given parts.
    pub fn join(parts: Vec<PropValue>) -> Self {
        PropValue::Join(parts)
    }

    /// An ordered list of values.
    pub fn list(items: Vec<PropValue>) -> Self {
        PropValue::List(items)
    }

    /// Whether any deferred part remains anywhere in this value.
    pub fn is_token(&self) -> bool {
        match self {
            PropValue::Literal(_) => false,
            PropValue::Ref(_) | PropValue::Attr { .. } => true,
            PropValue::Join(parts) | PropValue::List(parts) => parts.iter().any(|p| p.is_token()),
            PropValue::Map(entries) => entries.values().any(|p| p.is_token()),
        }
    }

    /// Handles of every construct this value refers to, transitively.
    pub fn references(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references(&self, out: &mut Vec<NodeId>) {
        match self {
            PropValue::Literal(_) => {}
            PropValue::Ref(target) | PropValue::Attr { target, .. } => {
                if !out.contains(target) {
                    out.push(*target);
                }
            }
            PropValue::Join(parts) | PropValue::List(parts) => {
                for part in parts {
                    part.collect_references(out);
                }
            }
            PropValue::Map(entries) => {
                for value in entries.values() {
                    value.collect_references(out);
                }
            }
        }
    }
}

impl From<Value> for PropValue {
    fn from(value: Value) -> Self {
        PropValue::Literal(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::string(value)
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::string(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Literal(Value::Bool(value))
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Literal(Value::from(value))
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Literal(Value::from(value))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Literal(Value::from(value))
    }
}
