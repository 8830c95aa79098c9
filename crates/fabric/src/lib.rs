//! Fabric - documents assembled from reusable, cross-referenced blocks.
//!
//! Source units declare documents, sections, content and data blocks. Blocks
//! from all units share one namespace, so a document in one file can
//! reference content defined in another. Rendering a document walks its block
//! tree, follows references, evaluates data and content plugins, and returns
//! the output lines together with every diagnostic found on the way.

pub mod config;
pub mod plugin;

mod assembler;
mod cancellation;
mod catalog;
mod data;
mod error;
mod interpolate;
mod metadata;
mod resolver;
mod source;
mod transform;

pub use fabric_core::{block, error as diagnostics, identifier, span};

pub use cancellation::Cancellation;
pub use catalog::Catalog;
pub use data::{DataContext, DataContextBuilder};
pub use error::FabricError;
pub use interpolate::{Evaluator, PathEvaluator, interpolate};
pub use metadata::RenderMetadata;
pub use resolver::{Resolution, ResolutionPath, Resolver};
pub use source::{ParsedUnit, SourceUnit};
pub use transform::Transformation;

use std::sync::Arc;

use log::{debug, info};

use fabric_core::error::{Diagnostic, Severity};

use assembler::{Assembler, Environment};
use config::AppConfig;
use plugin::{InvocationContext, PluginRegistry};

/// Everything a render produced.
///
/// Diagnostics are always returned, whether or not lines were produced.
#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    lines: Vec<String>,
    metadata: Option<RenderMetadata>,
    diagnostics: Vec<Diagnostic>,
}

impl RenderOutput {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Metadata of the rendered document; `None` if it was never found.
    pub fn metadata(&self) -> Option<&RenderMetadata> {
        self.metadata.as_ref()
    }

    /// Diagnostics in discovery order: parse errors first, then render ones.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The most severe diagnostic level reported, if anything was reported.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.diagnostics.iter().map(Diagnostic::severity).max()
    }

    pub fn has_errors(&self) -> bool {
        self.worst_severity().is_some_and(|severity| severity.is_error())
    }

    /// The lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn into_parts(self) -> (Vec<String>, Option<RenderMetadata>, Vec<Diagnostic>) {
        (self.lines, self.metadata, self.diagnostics)
    }

    fn failed(diagnostic: Diagnostic) -> Self {
        Self {
            lines: Vec::new(),
            metadata: None,
            diagnostics: vec![diagnostic],
        }
    }
}

/// Renders documents from source units.
///
/// A renderer holds configuration, the plugin registry and the expression
/// evaluator. It is `Send + Sync`; concurrent renders share nothing mutable.
///
/// # Examples
///
/// ```
/// use fabric::{Renderer, SourceUnit};
///
/// let units = [SourceUnit::new(
///     "greeting.fabric",
///     r#"
///     document "greeting" {
///       title = "Welcome"
///       content text { value = "Hello from fabric" }
///     }
///     "#,
/// )];
///
/// let output = Renderer::default().render(&units, "greeting");
/// assert_eq!(output.lines(), ["# Welcome", "Hello from fabric"]);
/// assert!(output.diagnostics().is_empty());
/// ```
pub struct Renderer {
    config: AppConfig,
    plugins: PluginRegistry,
    evaluator: Arc<dyn Evaluator>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Renderer {
    /// Create a renderer with the builtin plugins and the path evaluator.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            plugins: PluginRegistry::builtin(),
            evaluator: Arc::new(PathEvaluator),
        }
    }

    /// Replace the plugin registry.
    pub fn with_plugins(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = plugins;
        self
    }

    /// Replace the interpolation evaluator.
    pub fn with_evaluator(mut self, evaluator: impl Evaluator + 'static) -> Self {
        self.evaluator = Arc::new(evaluator);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Parse `units` and render `document`.
    pub fn render(&self, units: &[SourceUnit], document: &str) -> RenderOutput {
        self.render_with_cancellation(units, document, &Cancellation::new())
    }

    /// Like [`render`](Self::render), stopping early once `cancellation` trips.
    pub fn render_with_cancellation(
        &self,
        units: &[SourceUnit],
        document: &str,
        cancellation: &Cancellation,
    ) -> RenderOutput {
        info!(units = units.len(), document; "Rendering");

        match Catalog::from_sources(units) {
            Ok(catalog) => self.render_catalog(&catalog, document, cancellation),
            Err(diagnostic) => RenderOutput::failed(diagnostic),
        }
    }

    /// Render `document` from an already built catalog.
    ///
    /// The catalog's parse diagnostics come first in the output.
    pub fn render_catalog(
        &self,
        catalog: &Catalog,
        document: &str,
        cancellation: &Cancellation,
    ) -> RenderOutput {
        let cancellation = match self.config.render().timeout() {
            Some(timeout) => cancellation.clone().with_timeout(timeout),
            None => cancellation.clone(),
        };

        let env = Environment {
            catalog,
            plugins: &self.plugins,
            evaluator: self.evaluator.as_ref(),
            invocation: InvocationContext::new(self.config.plugins().base_dir()),
            heading_marker: self.config.render().heading_marker(),
            cancellation: &cancellation,
        };
        let assembly = Assembler::new(env).assemble(document);

        let mut diagnostics = catalog.parse_diagnostics().to_vec();
        diagnostics.extend(assembly.diagnostics);
        debug!(
            lines = assembly.lines.len(),
            diagnostics = diagnostics.len();
            "Render finished",
        );

        RenderOutput {
            lines: assembly.lines,
            metadata: assembly.metadata,
            diagnostics,
        }
    }
}

/// Render `document` from `units` with the default configuration.
pub fn render(units: &[SourceUnit], document: &str) -> RenderOutput {
    Renderer::default().render(units, document)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_renderer_is_send_sync() {
        assert_send_sync::<Renderer>();
        assert_send_sync::<RenderOutput>();
    }

    #[test]
    fn test_empty_input_fails_without_output() {
        let output = render(&[], "anything");

        assert!(output.lines().is_empty());
        assert!(output.metadata().is_none());
        assert_eq!(output.diagnostics().len(), 1);
        assert_eq!(output.diagnostics()[0].message(), "No fabric files found");
        assert!(output.has_errors());
        assert_eq!(output.worst_severity(), Some(Severity::Error));
    }

    #[test]
    fn test_text_joins_lines() {
        let units = [SourceUnit::new(
            "a.fabric",
            r#"document "d" { content text { value = "a\nb" } }"#,
        )];
        let output = render(&units, "d");
        assert_eq!(output.text(), "a\nb");
        assert_eq!(output.worst_severity(), None);
    }
}
