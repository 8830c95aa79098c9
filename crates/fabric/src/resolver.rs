//! Reference resolution.
//!
//! A `ref` block points at another block of the same kind through its `base`
//! attribute. The target may itself be a `ref`, so resolution follows the
//! chain iteratively until it reaches a concrete block. Every key visited on
//! the way is pushed onto the caller's [`ResolutionPath`], which is how cycles
//! are detected no matter how many hops or nesting levels they span.

use std::{fmt::Write as _, sync::Arc};

use log::trace;

use fabric_core::{
    block::{BlockDefinition, BlockKey, attr},
    error::{Diagnostic, DiagnosticSink, ErrorCode},
};

use crate::catalog::Catalog;

/// The keys on the branch currently being rendered, outermost first.
///
/// Used for cycle detection only. It is truncated back to a mark once a
/// subtree is done, so sibling branches never see each other's keys.
#[derive(Debug, Clone, Default)]
pub struct ResolutionPath {
    keys: Vec<BlockKey>,
}

impl ResolutionPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &BlockKey) -> bool {
        self.keys.contains(key)
    }

    pub fn push(&mut self, key: BlockKey) {
        self.keys.push(key);
    }

    /// Current depth; pass it to [`truncate`](Self::truncate) to pop back.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn truncate(&mut self, mark: usize) {
        self.keys.truncate(mark);
    }

    /// Render the cycle closed by `key`: `a -> b -> c -> a`.
    pub fn cycle_chain(&self, key: &BlockKey) -> String {
        let start = self.keys.iter().position(|k| k == key).unwrap_or(0);
        let mut chain = String::new();
        for k in &self.keys[start..] {
            let _ = write!(chain, "{k} -> ");
        }
        let _ = write!(chain, "{key}");
        chain
    }
}

/// Build the diagnostic for a key that closes a cycle on `path`.
pub(crate) fn circular_reference(
    path: &ResolutionPath,
    key: &BlockKey,
    at: &BlockDefinition,
) -> Diagnostic {
    Diagnostic::error("Circular reference detected")
        .with_code(ErrorCode::E301)
        .with_detail(path.cycle_chain(key))
        .with_optional_label(at.location(), format!("`{key}` refers back to itself"))
        .with_help("break the cycle by pointing one of these blocks elsewhere")
}

/// A resolved reference chain.
#[derive(Debug, Clone)]
pub struct Resolution {
    target: Arc<BlockDefinition>,
    hops: Vec<Arc<BlockDefinition>>,
}

impl Resolution {
    /// The concrete, non-`ref` block at the end of the chain.
    pub fn target(&self) -> &Arc<BlockDefinition> {
        &self.target
    }

    /// The `ref` blocks that were followed, outermost first.
    pub fn hops(&self) -> &[Arc<BlockDefinition>] {
        &self.hops
    }
}

/// Follows `ref` chains through a [`Catalog`].
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Resolve the reference `origin` down to a concrete block.
    ///
    /// Every followed key is pushed onto `path`; the caller truncates the
    /// path when it is done with the resolved subtree. On failure one
    /// diagnostic is emitted and `None` is returned.
    pub fn resolve(
        &self,
        origin: &Arc<BlockDefinition>,
        path: &mut ResolutionPath,
        sink: &mut DiagnosticSink,
    ) -> Option<Resolution> {
        let mut hops = vec![Arc::clone(origin)];
        let mut current = Arc::clone(origin);

        loop {
            let key = match self.base_key(&current) {
                Ok(key) => key,
                Err(diagnostic) => {
                    sink.emit(diagnostic);
                    return None;
                }
            };
            trace!(from = current.key().to_string(), to = key.to_string(); "Following reference");

            if path.contains(&key) {
                sink.emit(circular_reference(path, &key, &current));
                return None;
            }
            path.push(key);

            let Some(target) = self.catalog.lookup(&key) else {
                sink.emit(
                    Diagnostic::error("Reference not found")
                        .with_code(ErrorCode::E300)
                        .with_detail(format!("block `{key}` is not defined in any source unit"))
                        .with_optional_label(current.location(), "referenced here"),
                );
                return None;
            };
            if let Some(warning) = self.catalog.duplicate_warning(&key) {
                sink.emit(warning);
            }

            if target.kind() != current.kind() {
                sink.emit(
                    Diagnostic::error("Reference kind mismatch")
                        .with_code(ErrorCode::E302)
                        .with_detail(format!(
                            "a `{}` reference cannot point at `{key}`",
                            current.kind()
                        ))
                        .with_optional_label(current.location(), "referenced here")
                        .with_help(format!("reference a `{}` block instead", current.kind())),
                );
                return None;
            }

            if target.is_ref() {
                hops.push(Arc::clone(target));
                current = Arc::clone(target);
                continue;
            }

            return Some(Resolution {
                target: Arc::clone(target),
                hops,
            });
        }
    }

    fn base_key(&self, block: &BlockDefinition) -> Result<BlockKey, Diagnostic> {
        let Some(base) = block.attribute(attr::BASE) else {
            return Err(Diagnostic::error("Reference without base")
                .with_code(ErrorCode::E303)
                .with_detail(format!("`{}` has no `base` attribute", block.key()))
                .with_optional_label(block.location(), "reference block")
                .with_help("add `base = <kind>.<type>.<name>`"));
        };

        match base.as_reference() {
            Some(Ok(key)) => Ok(key),
            Some(Err(err)) => Err(Diagnostic::error("invalid reference path")
                .with_code(ErrorCode::E101)
                .with_detail(err.to_string())
                .with_optional_label(block.location(), "reference block")),
            None => Err(Diagnostic::error("invalid reference path")
                .with_code(ErrorCode::E101)
                .with_detail(format!(
                    "`base` must be a reference path, found a {}",
                    base.type_name()
                ))
                .with_optional_label(block.location(), "reference block")),
        }
    }
}
