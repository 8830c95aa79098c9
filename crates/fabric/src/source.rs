//! Source units: named pieces of Fabric text.

use std::{fs, path::Path, sync::Arc};

use fabric_core::{block::BlockDefinition, error::Diagnostic};

use crate::error::FabricError;

/// One named source text. Names identify units in diagnostics and fix the
/// order in which units are merged into a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    name: String,
    source: String,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Read a unit from disk, naming it after its path.
    pub fn from_path(path: &Path) -> Result<Self, FabricError> {
        let source = fs::read_to_string(path)?;
        Ok(Self::new(path.display().to_string(), source))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parse the unit. Failures become diagnostics and an empty block list.
    pub fn parse(&self) -> ParsedUnit {
        match fabric_parser::parse(&self.name, &self.source) {
            Ok(blocks) => ParsedUnit {
                name: self.name.clone(),
                blocks,
                diagnostics: Vec::new(),
            },
            Err(err) => ParsedUnit {
                name: self.name.clone(),
                blocks: Vec::new(),
                diagnostics: err.into_diagnostics(),
            },
        }
    }
}

/// The outcome of parsing one [`SourceUnit`].
#[derive(Debug, Clone)]
pub struct ParsedUnit {
    name: String,
    blocks: Vec<Arc<BlockDefinition>>,
    diagnostics: Vec<Diagnostic>,
}

impl ParsedUnit {
    /// A unit built from already-parsed blocks.
    pub fn new(name: impl Into<String>, blocks: Vec<Arc<BlockDefinition>>) -> Self {
        Self {
            name: name.into(),
            blocks,
            diagnostics: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blocks(&self) -> &[Arc<BlockDefinition>] {
        &self.blocks
    }

    /// Parse errors of the unit. A unit with errors has no blocks.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
