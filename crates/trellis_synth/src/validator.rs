//! Tree-wide validation aggregation.
//!
//! Every resource kind can report self-check failures; the validator walks
//! the whole tree and collects all of them before anything is surfaced, so
//! a batch of edits produces one complete report instead of an
//! edit/re-run loop per error.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use trellis_core::ConstructTree;

/// Accumulated validation failures, keyed by node path.
///
/// An empty report means the tree passed validation. Entries keep the
/// order in which nodes were visited; messages keep the order the node
/// reported them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    entries: IndexMap<String, Vec<String>>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Record a failure message against a node path.
    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.entries.entry(path.into()).or_default().push(message.into());
    }

    /// Whether the tree passed validation.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of failure messages across all nodes.
    pub fn error_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// The failing node paths and their messages.
    pub fn entries(&self) -> &IndexMap<String, Vec<String>> {
        &self.entries
    }

    /// Messages recorded against a specific node path.
    pub fn messages(&self, path: &str) -> Option<&[String]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        for (path, messages) in other.entries {
            self.entries.entry(path).or_default().extend(messages);
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error(s) across {} construct(s)",
            self.error_count(),
            self.entries.len()
        )?;
        for (path, messages) in &self.entries {
            for message in messages {
                write!(f, "\n  {}: {}", path, message)?;
            }
        }
        Ok(())
    }
}

/// Post-order validation walk over a construct tree.
pub struct TreeValidator;

impl TreeValidator {
    /// Run every bound resource's self-check and collect all failures.
    ///
    /// The walk never short-circuits: a failing node does not hide
    /// failures elsewhere in the tree.
    pub fn validate(tree: &ConstructTree) -> ValidationReport {
        let mut report = ValidationReport::new();
        for id in tree.post_order() {
            let Some(kind) = tree.kind(id) else { continue };
            let messages = kind.validate();
            if messages.is_empty() {
                continue;
            }
            let Ok(path) = tree.path(id) else { continue };
            debug!("Construct '{}' failed {} self-check(s)", path, messages.len());
            for message in messages {
                report.add(&path, message);
            }
        }
        report
    }
}
