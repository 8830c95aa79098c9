//! Document assembly.
//!
//! The assembler walks a document depth-first in declaration order and
//! produces its output lines bottom-up. Every node failure is contained: the
//! node contributes no lines, a diagnostic is recorded, and its siblings are
//! rendered as usual.

use std::sync::Arc;

use log::{debug, info, trace};

use fabric_core::{
    block::{BlockDefinition, BlockKey, BlockKind, attr, attributes_to_json},
    error::{Diagnostic, DiagnosticSink, ErrorCode},
    identifier::Id,
};

use crate::{
    cancellation::Cancellation,
    catalog::Catalog,
    data::{self, DataContext, DataContextBuilder},
    interpolate::{Evaluator, interpolate},
    metadata::RenderMetadata,
    plugin::{InvocationContext, PluginRegistry, value_to_text},
    resolver::{ResolutionPath, Resolver, circular_reference},
    transform::apply_format,
};

/// Result of assembling one document.
#[derive(Debug)]
pub(crate) struct Assembly {
    pub lines: Vec<String>,
    pub metadata: Option<RenderMetadata>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Shared, read-only inputs of a render.
#[derive(Clone, Copy)]
pub(crate) struct Environment<'a> {
    pub catalog: &'a Catalog,
    pub plugins: &'a PluginRegistry,
    pub evaluator: &'a dyn Evaluator,
    pub invocation: InvocationContext<'a>,
    pub heading_marker: &'a str,
    pub cancellation: &'a Cancellation,
}

/// Per-render state. Owned by exactly one render.
pub(crate) struct Assembler<'a> {
    env: Environment<'a>,
    path: ResolutionPath,
    data: DataContext,
    sink: DiagnosticSink,
    cancelled: bool,
    plugin_calls: usize,
}

impl<'a> Assembler<'a> {
    pub fn new(env: Environment<'a>) -> Self {
        Self {
            env,
            path: ResolutionPath::new(),
            data: DataContext::new(),
            sink: DiagnosticSink::new(),
            cancelled: false,
            plugin_calls: 0,
        }
    }

    /// Render the document named `document`.
    pub fn assemble(mut self, document: &str) -> Assembly {
        info!(document; "Assembling document");
        let key = BlockKey::document(document);

        let Some(root) = self.env.catalog.lookup(&key).cloned() else {
            self.sink.emit(
                Diagnostic::error("Document not found")
                    .with_code(ErrorCode::E202)
                    .with_detail(format!("no document named `{document}` in any source unit"))
                    .with_help("check the document name or the input files"),
            );
            return Assembly {
                lines: Vec::new(),
                metadata: None,
                diagnostics: self.sink.into_diagnostics(),
            };
        };
        if let Some(warning) = self.env.catalog.duplicate_warning(&key) {
            self.sink.emit(warning);
        }

        let lines = self.visit(&root);

        let metadata = RenderMetadata::new(
            document,
            root.title().map(str::to_string),
            attributes_to_json(root.meta()),
            self.data.names().map(str::to_string).collect(),
            self.plugin_calls,
        );
        info!(
            document,
            lines = lines.len(),
            diagnostics = self.sink.len(),
            cancelled = self.cancelled;
            "Document assembled",
        );

        Assembly {
            lines,
            metadata: Some(metadata),
            diagnostics: self.sink.into_diagnostics(),
        }
    }

    /// Poll for cancellation. The first time it trips, one error is emitted.
    fn check_cancelled(&mut self) -> bool {
        if self.cancelled {
            return true;
        }
        if self.env.cancellation.is_cancelled() {
            debug!("Render cancelled");
            self.cancelled = true;
            self.sink.emit(
                Diagnostic::error("Render cancelled")
                    .with_code(ErrorCode::E600)
                    .with_detail("the render was cancelled or ran past its deadline; output is incomplete"),
            );
        }
        self.cancelled
    }

    /// Visit a block found in place, as the child of the block being rendered.
    fn visit(&mut self, block: &Arc<BlockDefinition>) -> Vec<String> {
        if self.check_cancelled() {
            return Vec::new();
        }

        let key = block.key();
        trace!(block = key.to_string(); "Visiting block");

        let mark = self.path.len();
        if key.is_addressable() {
            if self.path.contains(&key) {
                self.sink.emit(circular_reference(&self.path, &key, block));
                return Vec::new();
            }
            self.path.push(key);
        }

        let lines = if block.is_ref() {
            self.render_reference(block)
        } else {
            self.render_concrete(block)
        };

        self.path.truncate(mark);
        lines
    }

    fn render_concrete(&mut self, block: &Arc<BlockDefinition>) -> Vec<String> {
        if block.kind() == BlockKind::Data {
            self.evaluate_data(block, block.name());
            return Vec::new();
        }

        let body = self.render_body(block);
        self.with_heading(block.title(), body)
    }

    /// Resolve a `ref` block and render what it points at.
    ///
    /// Transformations apply innermost first: the target's own `format_as`,
    /// then each hop's from the innermost `ref` outwards. Overlaid attributes
    /// come from the outermost hop that sets them.
    fn render_reference(&mut self, block: &Arc<BlockDefinition>) -> Vec<String> {
        let resolver = Resolver::new(self.env.catalog);
        let Some(resolution) = resolver.resolve(block, &mut self.path, &mut self.sink) else {
            return Vec::new();
        };
        if self.check_cancelled() {
            return Vec::new();
        }

        let target = Arc::clone(resolution.target());
        let hops = resolution.hops();
        debug!(
            reference = block.key().to_string(),
            target = target.key().to_string(),
            hops = hops.len();
            "Reference resolved",
        );

        if target.kind() == BlockKind::Data {
            let name = hops.iter().find_map(|hop| hop.name()).or(target.name());
            self.evaluate_data(&target, name);
            return Vec::new();
        }

        let body = self.render_body(&target);
        let body = hops
            .iter()
            .rev()
            .fold(body, |lines, hop| apply_format(hop, lines, &mut self.sink));

        let title = hops
            .iter()
            .find_map(|hop| hop.title())
            .or(target.title());
        self.with_heading(title, body)
    }

    /// The block's lines without heading, after its own `format_as`.
    fn render_body(&mut self, block: &Arc<BlockDefinition>) -> Vec<String> {
        let lines = match block.kind() {
            BlockKind::Document | BlockKind::Section => {
                let mut lines = Vec::new();
                for child in block.children() {
                    lines.extend(self.visit(child));
                }
                lines
            }
            BlockKind::Content if block.is_text() => self.render_text(block),
            BlockKind::Content => self.render_plugin(block),
            BlockKind::Data => {
                self.evaluate_data(block, block.name());
                return Vec::new();
            }
        };

        apply_format(block, lines, &mut self.sink)
    }

    fn with_heading(&self, title: Option<&str>, body: Vec<String>) -> Vec<String> {
        match title {
            Some(title) => {
                let mut lines = Vec::with_capacity(body.len() + 1);
                lines.push(format!("{} {title}", self.env.heading_marker));
                lines.extend(body);
                lines
            }
            None => body,
        }
    }

    fn render_text(&mut self, block: &BlockDefinition) -> Vec<String> {
        let Some(value) = block.attribute(attr::VALUE) else {
            return Vec::new();
        };
        let text = match value.as_str() {
            Some(text) => text.to_string(),
            None => value_to_text(&value.to_json()),
        };

        match interpolate(&text, self.env.evaluator, &self.data) {
            Ok(text) => split_lines(&text),
            Err(message) => {
                self.sink.emit(
                    Diagnostic::error("Interpolation failed")
                        .with_code(ErrorCode::E503)
                        .with_detail(message)
                        .with_optional_label(block.location(), "in this text block"),
                );
                Vec::new()
            }
        }
    }

    fn render_plugin(&mut self, block: &BlockDefinition) -> Vec<String> {
        self.plugin_calls += 1;
        self.env
            .plugins
            .invoke(block, &self.data, self.env.invocation, &mut self.sink)
            .map(|value| split_lines(&value_to_text(&value)))
            .unwrap_or_default()
    }

    fn evaluate_data(&mut self, block: &BlockDefinition, name: Option<Id>) {
        let Some(name) = name else {
            self.sink.emit(data::anonymous_data(block));
            return;
        };

        self.plugin_calls += 1;
        DataContextBuilder::new(self.env.plugins, self.env.invocation).apply(
            block,
            &name.to_string(),
            &mut self.data,
            &mut self.sink,
        );
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}
