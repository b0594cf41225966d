//! The resolved deployment document.
//!
//! The document is the synthesizer's output: a flat mapping from logical id
//! to resource description, with every deferred value reduced to either a
//! literal or a tagged reference expression the provisioning engine knows
//! how to substitute. Logical ids are the join key; the engine attaches no
//! meaning to entry order.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::SynthResult;

/// File name used by [`OutputDocument::write_to`].
pub const DOCUMENT_FILE_NAME: &str = "deployment.json";

/// A reference expression left for the provisioning engine to substitute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefExpr {
    /// The runtime identity of the resource with the given logical id.
    Ref(String),
    /// A named runtime attribute of the resource with the given logical id.
    AttributeRef { target: String, attribute: String },
    /// String concatenation over resolved parts.
    Join(Vec<ResolvedValue>),
}

/// A fully resolved property value: a literal, or a reference expression
/// with no residual placeholders anywhere inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Expr(RefExpr),
    List(Vec<ResolvedValue>),
    Map(IndexMap<String, ResolvedValue>),
    Literal(Value),
}

impl ResolvedValue {
    /// A literal value.
    pub fn literal(value: impl Into<Value>) -> Self {
        ResolvedValue::Literal(value.into())
    }

    /// The literal string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ResolvedValue::Literal(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// The referenced logical id, if this is a `ref` expression.
    pub fn as_ref_id(&self) -> Option<&str> {
        match self {
            ResolvedValue::Expr(RefExpr::Ref(id)) => Some(id),
            _ => None,
        }
    }

    /// The `(target, attribute)` pair, if this is an `attribute-ref`
    /// expression.
    pub fn as_attribute_ref(&self) -> Option<(&str, &str)> {
        match self {
            ResolvedValue::Expr(RefExpr::AttributeRef { target, attribute }) => {
                Some((target.as_str(), attribute.as_str()))
            }
            _ => None,
        }
    }

    /// Whether this value is a reference expression at the top level.
    pub fn is_expr(&self) -> bool {
        matches!(self, ResolvedValue::Expr(_))
    }
}

/// One resource entry in the deployment document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// The provider-facing type string.
    pub kind: String,
    /// Fully resolved provider properties.
    pub properties: IndexMap<String, ResolvedValue>,
}

/// The deployment document: logical id to resource description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputDocument {
    resources: IndexMap<String, ResourceEntry>,
}

impl OutputDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            resources: IndexMap::new(),
        }
    }

    /// Insert a resource entry, returning the previous entry under the same
    /// logical id if one existed.
    pub fn insert(&mut self, logical_id: impl Into<String>, entry: ResourceEntry) -> Option<ResourceEntry> {
        self.resources.insert(logical_id.into(), entry)
    }

    /// Look up a resource entry by logical id.
    pub fn get(&self, logical_id: &str) -> Option<&ResourceEntry> {
        self.resources.get(logical_id)
    }

    /// Check whether a logical id is present.
    pub fn contains(&self, logical_id: &str) -> bool {
        self.resources.contains_key(logical_id)
    }

    /// All logical ids in the document.
    pub fn ids(&self) -> Vec<&str> {
        self.resources.keys().map(String::as_str).collect()
    }

    /// Iterate over `(logical id, entry)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceEntry)> {
        self.resources.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    /// Number of resource entries.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if the document has no entries.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Render the document as pretty-printed JSON.
    pub fn to_json_string(&self) -> SynthResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document from its JSON rendering.
    pub fn from_json_str(content: &str) -> SynthResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Write the document into `dir` as [`DOCUMENT_FILE_NAME`], creating
    /// the directory if needed. Returns the written path.
    pub fn write_to(&self, dir: &Path) -> SynthResult<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(DOCUMENT_FILE_NAME);
        fs::write(&path, self.to_json_string()?)?;
        info!(
            "Wrote deployment document with {} resource(s) to {}",
            self.len(),
            path.display()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expression_tags() {
        let reference = serde_json::to_value(ResolvedValue::Expr(RefExpr::Ref("Api1234".into()))).unwrap();
        assert_eq!(reference, json!({ "ref": "Api1234" }));

        let attribute = serde_json::to_value(ResolvedValue::Expr(RefExpr::AttributeRef {
            target: "Db5678".into(),
            attribute: "arn".into(),
        }))
        .unwrap();
        assert_eq!(
            attribute,
            json!({ "attribute-ref": { "target": "Db5678", "attribute": "arn" } })
        );

        let join = serde_json::to_value(ResolvedValue::Expr(RefExpr::Join(vec![
            ResolvedValue::literal("https://"),
            ResolvedValue::Expr(RefExpr::Ref("Api1234".into())),
        ])))
        .unwrap();
        assert_eq!(
            join,
            json!({ "join": ["https://", { "ref": "Api1234" }] })
        );
    }

    #[test]
    fn test_literals_serialize_unwrapped() {
        let value = serde_json::to_value(ResolvedValue::literal("my-service")).unwrap();
        assert_eq!(value, json!("my-service"));
    }

    #[test]
    fn test_document_round_trips_through_json() {
        let mut document = OutputDocument::new();
        let mut properties = IndexMap::new();
        properties.insert("name".to_string(), ResolvedValue::literal("my-service"));
        properties.insert(
            "cluster".to_string(),
            ResolvedValue::Expr(RefExpr::Ref("Cluster1234".into())),
        );
        document.insert(
            "Service5678",
            ResourceEntry {
                kind: "container/service".into(),
                properties,
            },
        );

        let rendered = document.to_json_string().unwrap();
        let parsed = OutputDocument::from_json_str(&rendered).unwrap();
        assert_eq!(parsed.len(), 1);
        let entry = parsed.get("Service5678").unwrap();
        assert_eq!(entry.kind, "container/service");
        assert_eq!(entry.properties["name"].as_str(), Some("my-service"));
        assert_eq!(entry.properties["cluster"].as_ref_id(), Some("Cluster1234"));
    }

    #[test]
    fn test_write_to_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out").join("assembly");

        let document = OutputDocument::new();
        let path = document.write_to(&target).unwrap();

        assert!(path.exists());
        assert!(path.ends_with(DOCUMENT_FILE_NAME));
        let content = fs::read_to_string(path).unwrap();
        assert_eq!(OutputDocument::from_json_str(&content).unwrap(), document);
    }
}
