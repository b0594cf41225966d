//! Token resolution.
//!
//! Resolution is a pure recursive descent over deferred property values:
//! references become expressions on allocated logical ids, concatenations
//! collapse their literal runs, and attribute references whose target emits
//! the attribute itself substitute inline. The cycle guard travels with the
//! resolution chain, so disjoint subtrees can be resolved independently
//! without sharing state.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use trellis_core::{ConstructTree, IdAllocator, NodeId, PropValue};

use crate::document::{RefExpr, ResolvedValue};
use crate::error::{SynthError, SynthResult};

/// The active resolution chain: one per top-level property resolution.
///
/// Keys are `(node, attribute)` pairs currently being substituted inline;
/// revisiting a key means the chain can never terminate.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    stack: Vec<(NodeId, String)>,
}

impl ResolutionContext {
    fn new(node: NodeId, attribute: &str) -> Self {
        Self {
            stack: vec![(node, attribute.to_string())],
        }
    }

    fn contains(&self, node: NodeId, attribute: &str) -> bool {
        self.stack
            .iter()
            .any(|(n, a)| *n == node && a == attribute)
    }

    fn push(&mut self, node: NodeId, attribute: &str) {
        self.stack.push((node, attribute.to_string()));
    }

    fn pop(&mut self) {
        self.stack.pop();
    }
}

/// Resolves deferred values against a construct tree.
pub struct TokenResolver<'a> {
    tree: &'a ConstructTree,
    emitted: &'a HashMap<NodeId, IndexMap<String, PropValue>>,
}

impl<'a> TokenResolver<'a> {
    /// Create a resolver over a tree and the property mappings its
    /// resource nodes emitted for this pass.
    pub fn new(
        tree: &'a ConstructTree,
        emitted: &'a HashMap<NodeId, IndexMap<String, PropValue>>,
    ) -> Self {
        Self { tree, emitted }
    }

    /// Resolve one emitted property of `node`.
    ///
    /// Seeds the cycle guard with the property itself so self-references
    /// are caught on the first revisit.
    pub fn resolve_property(
        &self,
        node: NodeId,
        property: &str,
        value: &PropValue,
    ) -> SynthResult<ResolvedValue> {
        let mut ctx = ResolutionContext::new(node, property);
        self.resolve(value, &mut ctx)
    }

    fn resolve(&self, value: &PropValue, ctx: &mut ResolutionContext) -> SynthResult<ResolvedValue> {
        match value {
            PropValue::Literal(literal) => Ok(ResolvedValue::Literal(literal.clone())),
            PropValue::Ref(target) => {
                self.ensure_live(*target)?;
                Ok(ResolvedValue::Expr(RefExpr::Ref(self.logical_id(*target)?)))
            }
            PropValue::Attr { target, attribute } => self.resolve_attr(*target, attribute, ctx),
            PropValue::Join(parts) => self.resolve_join(parts, ctx),
            PropValue::List(items) => Ok(ResolvedValue::List(
                items
                    .iter()
                    .map(|item| self.resolve(item, ctx))
                    .collect::<SynthResult<_>>()?,
            )),
            PropValue::Map(entries) => {
                let mut resolved = IndexMap::with_capacity(entries.len());
                for (key, entry) in entries {
                    resolved.insert(key.clone(), self.resolve(entry, ctx)?);
                }
                Ok(ResolvedValue::Map(resolved))
            }
        }
    }

    /// Resolve an attribute reference.
    ///
    /// When the target emits the attribute as one of its own properties,
    /// the reference substitutes inline by resolving that property; the
    /// engine never sees it. Anything else defers to an `attribute-ref`
    /// expression on the target's logical id.
    fn resolve_attr(
        &self,
        target: NodeId,
        attribute: &str,
        ctx: &mut ResolutionContext,
    ) -> SynthResult<ResolvedValue> {
        self.ensure_live(target)?;
        if let Some(inner) = self.emitted.get(&target).and_then(|props| props.get(attribute)) {
            if ctx.contains(target, attribute) {
                return Err(self.cycle_error(ctx, target, attribute));
            }
            ctx.push(target, attribute);
            let resolved = self.resolve(inner, ctx)?;
            ctx.pop();
            return Ok(resolved);
        }
        Ok(ResolvedValue::Expr(RefExpr::AttributeRef {
            target: self.logical_id(target)?,
            attribute: attribute.to_string(),
        }))
    }

    /// Resolve a concatenation, collapsing adjacent literal parts.
    fn resolve_join(&self, parts: &[PropValue], ctx: &mut ResolutionContext) -> SynthResult<ResolvedValue> {
        let mut out: Vec<ResolvedValue> = Vec::new();
        let mut run = String::new();
        for part in parts {
            let resolved = self.resolve(part, ctx)?;
            Self::push_join_part(&mut out, &mut run, resolved)?;
        }
        if !run.is_empty() || out.is_empty() {
            out.push(ResolvedValue::Literal(Value::String(run)));
        }
        if out.len() == 1 && matches!(out[0], ResolvedValue::Literal(_)) {
            return Ok(out.remove(0));
        }
        Ok(ResolvedValue::Expr(RefExpr::Join(out)))
    }

    fn push_join_part(
        out: &mut Vec<ResolvedValue>,
        run: &mut String,
        part: ResolvedValue,
    ) -> SynthResult<()> {
        match part {
            ResolvedValue::Literal(literal) => {
                let fragment = Self::scalar_fragment(&literal).ok_or_else(|| {
                    SynthError::UnresolvableToken(format!(
                        "cannot concatenate non-scalar literal: {literal}"
                    ))
                })?;
                run.push_str(&fragment);
            }
            // Nested concatenations flatten into the outer expression.
            ResolvedValue::Expr(RefExpr::Join(inner)) => {
                for nested in inner {
                    Self::push_join_part(out, run, nested)?;
                }
            }
            other => {
                if !run.is_empty() {
                    out.push(ResolvedValue::Literal(Value::String(std::mem::take(run))));
                }
                out.push(other);
            }
        }
        Ok(())
    }

    fn scalar_fragment(literal: &Value) -> Option<String> {
        match literal {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn ensure_live(&self, target: NodeId) -> SynthResult<()> {
        if self.tree.contains(target) {
            return Ok(());
        }
        match self.tree.path(target) {
            Ok(path) => Err(SynthError::UnresolvableToken(format!(
                "referenced construct '{path}' was detached before synthesis"
            ))),
            Err(_) => Err(SynthError::UnresolvableToken(format!(
                "referenced construct {target} is not part of this tree"
            ))),
        }
    }

    fn logical_id(&self, target: NodeId) -> SynthResult<String> {
        Ok(IdAllocator::allocate(&self.tree.path_components(target)?)?)
    }

    fn cycle_error(&self, ctx: &ResolutionContext, node: NodeId, attribute: &str) -> SynthError {
        let start = ctx
            .stack
            .iter()
            .position(|(n, a)| *n == node && a == attribute)
            .unwrap_or(0);
        let mut cycle: Vec<String> = ctx.stack[start..]
            .iter()
            .map(|(n, a)| self.describe(*n, a))
            .collect();
        cycle.push(self.describe(node, attribute));
        SynthError::CyclicReference { cycle }
    }

    fn describe(&self, node: NodeId, attribute: &str) -> String {
        match self.tree.path(node) {
            Ok(path) => format!("{path}.{attribute}"),
            Err(_) => format!("{node}.{attribute}"),
        }
    }
}
