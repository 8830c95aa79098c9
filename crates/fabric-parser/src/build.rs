//! Build phase: raw syntax tree to immutable block definitions.
//!
//! Structural rules that the grammar does not enforce are checked here, and
//! every violation in the unit is collected before the unit is rejected.

use std::sync::Arc;

use log::{debug, trace};

use fabric_core::{
    block::{Attributes, BlockDefinition, BlockKind},
    error::{Diagnostic, DiagnosticSink, ErrorCode},
    identifier::Id,
    span::{SourceLocation, Span},
};

use crate::parser_types::{RawAttribute, RawBlock, RawItem};

pub(crate) struct Builder<'a> {
    unit: &'a Arc<str>,
    sink: DiagnosticSink,
}

impl<'a> Builder<'a> {
    pub fn new(unit: &'a Arc<str>) -> Self {
        Self {
            unit,
            sink: DiagnosticSink::new(),
        }
    }

    /// Build all top-level blocks of a unit.
    pub fn build(
        mut self,
        blocks: &[RawBlock<'_>],
    ) -> Result<Vec<Arc<BlockDefinition>>, Vec<Diagnostic>> {
        debug!(unit = self.unit.as_ref(), blocks = blocks.len(); "Building block definitions");

        let definitions: Vec<_> = blocks
            .iter()
            .map(|block| Arc::new(self.build_block(block, true)))
            .collect();

        if self.sink.has_errors() {
            Err(self.sink.into_diagnostics())
        } else {
            Ok(definitions)
        }
    }

    fn location(&self, span: Span) -> SourceLocation {
        SourceLocation::new(self.unit.clone(), span)
    }

    fn build_block(&mut self, block: &RawBlock<'_>, top_level: bool) -> BlockDefinition {
        let kind = *block.kind.inner();
        trace!(kind = kind.as_str(); "Building block");

        self.check_shape(block, top_level);

        let mut definition = BlockDefinition::new(
            kind,
            block.block_type.as_ref().map(|t| Id::new(t.inner())),
            block.name.as_ref().map(|n| Id::new(n.inner())),
        )
        .with_location(self.location(block.span));

        let mut attributes: Vec<&RawAttribute<'_>> = Vec::new();
        let mut config: Vec<&RawAttribute<'_>> = Vec::new();
        let mut meta: Vec<&RawAttribute<'_>> = Vec::new();

        for item in &block.items {
            match item {
                RawItem::Attribute(attribute) => attributes.push(attribute),
                RawItem::Config(group) => config.extend(group),
                RawItem::Meta(group) => meta.extend(group),
                RawItem::Block(child) => {
                    let child = self.build_block(child, false);
                    definition = definition.with_child(child);
                }
            }
        }

        for (name, value) in self.collect_attributes(&attributes) {
            definition = definition.with_attribute(name, value);
        }
        let config = self.collect_attributes(&config);
        let meta = self.collect_attributes(&meta);

        definition.with_config(config).with_meta(meta)
    }

    /// Check the rules tying a block's kind to its type, name and position.
    fn check_shape(&mut self, block: &RawBlock<'_>, top_level: bool) {
        let kind = *block.kind.inner();
        let kind_location = self.location(block.kind.span());

        if kind.requires_type() && block.block_type.is_none() {
            self.sink.emit(
                Diagnostic::error(format!("`{kind}` block is missing its type"))
                    .with_code(ErrorCode::E100)
                    .with_label(kind_location.clone(), "type expected after this keyword")
                    .with_help(format!("write `{kind} <type> \"name\" {{ ... }}`, e.g. `{kind} text`")),
            );
        }

        if kind == BlockKind::Document {
            if let Some(block_type) = &block.block_type {
                self.sink.emit(
                    Diagnostic::error("documents do not take a type")
                        .with_code(ErrorCode::E100)
                        .with_label(self.location(block_type.span()), "unexpected type"),
                );
            }
            if block.name.is_none() {
                self.sink.emit(
                    Diagnostic::error("document must be named")
                        .with_code(ErrorCode::E100)
                        .with_label(kind_location.clone(), "anonymous document")
                        .with_help("write `document \"name\" { ... }`"),
                );
            }
            if !top_level {
                self.sink.emit(
                    Diagnostic::error("nested document not allowed")
                        .with_code(ErrorCode::E100)
                        .with_label(kind_location.clone(), "nested document")
                        .with_help("documents can only appear at the top level of a unit"),
                );
            }
        }

        if !kind.is_container() {
            let nested = block.items.iter().find_map(|item| match item {
                RawItem::Block(child) => Some(child),
                _ => None,
            });
            if let Some(child) = nested {
                self.sink.emit(
                    Diagnostic::error(format!("`{kind}` blocks cannot contain nested blocks"))
                        .with_code(ErrorCode::E100)
                        .with_label(self.location(child.kind.span()), "nested block")
                        .with_secondary_label(kind_location, "inside this block"),
                );
            }
        }
    }

    /// Collect attributes in order, reporting duplicate names.
    fn collect_attributes(&mut self, raw: &[&RawAttribute<'_>]) -> Attributes {
        let mut attributes = Attributes::new();
        let mut first_spans: Vec<(&str, Span)> = Vec::new();

        for attribute in raw {
            let name = *attribute.name.inner();
            if let Some((_, first)) = first_spans.iter().find(|(n, _)| *n == name) {
                self.sink.emit(
                    Diagnostic::error(format!("attribute `{name}` is defined multiple times"))
                        .with_code(ErrorCode::E102)
                        .with_label(self.location(attribute.name.span()), "duplicate attribute")
                        .with_secondary_label(self.location(*first), "first defined here")
                        .with_help("remove one of the definitions"),
                );
                continue;
            }
            first_spans.push((name, attribute.span));
            attributes.insert(name.to_string(), attribute.value.clone());
        }

        attributes
    }
}
