//! The block catalog: every named block of every unit in one namespace.
//!
//! A catalog is built once, never mutated afterwards and safe to share
//! between threads, so any number of renders can read it concurrently.

use std::{collections::HashMap, sync::Arc};

use log::{debug, trace};

use fabric_core::{
    block::{BlockDefinition, BlockKey},
    error::{Diagnostic, ErrorCode},
};

use crate::source::{ParsedUnit, SourceUnit};

/// Immutable index from [`BlockKey`] to block definition.
#[derive(Debug, Default)]
pub struct Catalog {
    blocks: HashMap<BlockKey, Arc<BlockDefinition>>,
    /// Later definitions of keys that were already taken.
    duplicates: HashMap<BlockKey, Vec<Arc<BlockDefinition>>>,
    /// Parse errors of units that contributed no blocks.
    parse_diagnostics: Vec<Diagnostic>,
    unit_names: Vec<String>,
}

impl Catalog {
    /// Merge parsed units into one catalog.
    ///
    /// Units are merged in name order, so the order in which they are passed
    /// in never changes which definition wins a duplicated key. The sort is
    /// stable: units sharing a name keep their relative order, which
    /// [`from_sources`](Self::from_sources) fixes by source text. Named blocks
    /// are indexed at any nesting depth; anonymous blocks are only reachable
    /// through their parents.
    ///
    /// # Errors
    ///
    /// Returns an `E200` diagnostic when `units` is empty.
    pub fn build(mut units: Vec<ParsedUnit>) -> Result<Self, Diagnostic> {
        if units.is_empty() {
            return Err(Diagnostic::error("No fabric files found")
                .with_code(ErrorCode::E200)
                .with_help("pass at least one `.fabric` file or a directory containing them"));
        }

        units.sort_by(|a, b| a.name().cmp(b.name()));

        let mut catalog = Self::default();
        for unit in &units {
            trace!(unit = unit.name(), blocks = unit.blocks().len(); "Merging unit");
            catalog.parse_diagnostics.extend_from_slice(unit.diagnostics());
            catalog.unit_names.push(unit.name().to_string());
            for block in unit.blocks() {
                catalog.register(block);
            }
        }

        debug!(
            units = catalog.unit_names.len(),
            blocks = catalog.blocks.len(),
            duplicated_keys = catalog.duplicates.len();
            "Catalog built",
        );
        Ok(catalog)
    }

    /// Parse every source unit and merge the results.
    ///
    /// Units are ordered by name, then by source text.
    pub fn from_sources(units: &[SourceUnit]) -> Result<Self, Diagnostic> {
        let mut ordered: Vec<&SourceUnit> = units.iter().collect();
        ordered.sort_by(|a, b| (a.name(), a.source()).cmp(&(b.name(), b.source())));
        Self::build(ordered.into_iter().map(SourceUnit::parse).collect())
    }

    fn register(&mut self, block: &Arc<BlockDefinition>) {
        let key = block.key();
        if key.is_addressable() {
            if self.blocks.contains_key(&key) {
                self.duplicates
                    .entry(key)
                    .or_default()
                    .push(Arc::clone(block));
            } else {
                self.blocks.insert(key, Arc::clone(block));
            }
        }

        for child in block.children() {
            self.register(child);
        }
    }

    /// Look up a block by key.
    pub fn lookup(&self, key: &BlockKey) -> Option<&Arc<BlockDefinition>> {
        self.blocks.get(key)
    }

    /// Definitions of `key` that lost to the first one.
    pub fn duplicates(&self, key: &BlockKey) -> &[Arc<BlockDefinition>] {
        self.duplicates.get(key).map_or(&[], Vec::as_slice)
    }

    /// The warning to report when a duplicated key is used, if it is duplicated.
    pub fn duplicate_warning(&self, key: &BlockKey) -> Option<Diagnostic> {
        let duplicates = self.duplicates(key);
        let winner = self.lookup(key)?;
        if duplicates.is_empty() {
            return None;
        }

        let mut diagnostic = Diagnostic::warning("Duplicate block definition")
            .with_code(ErrorCode::E201)
            .with_detail(format!(
                "`{key}` is defined {} times; the first definition is used",
                duplicates.len() + 1
            ))
            .with_optional_label(winner.location(), "this definition is used");
        for duplicate in duplicates {
            if let Some(location) = duplicate.location() {
                diagnostic = diagnostic.with_secondary_label(location.clone(), "also defined here");
            }
        }
        Some(diagnostic.with_help("rename one of the blocks"))
    }

    /// Parse errors collected while building the catalog.
    pub fn parse_diagnostics(&self) -> &[Diagnostic] {
        &self.parse_diagnostics
    }

    /// Names of the merged units, in merge order.
    pub fn unit_names(&self) -> &[String] {
        &self.unit_names
    }

    /// Number of indexed keys.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
