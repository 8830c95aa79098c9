//! Error adapter for converting FabricError to miette diagnostics.
//!
//! This module provides the bridge between the library's error types and
//! miette's rich diagnostic formatting used in the CLI.
//!
//! # Multiple Units
//!
//! A render reads several source units, and a diagnostic's labels may point
//! into any of them. Each diagnostic is shown against the unit of its primary
//! label; labels pointing into other units are dropped from the snippet.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use fabric::{
    FabricError, SourceUnit,
    diagnostics::{Diagnostic, Severity},
    span::Span,
};

/// Adapter for a single fabric diagnostic.
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    /// The unit the snippet is taken from, with its text.
    src: Option<(&'a str, &'a str)>,
}

impl<'a> DiagnosticAdapter<'a> {
    /// Create an adapter, picking the source text the diagnostic points into.
    pub fn new(diag: &'a Diagnostic, sources: &'a [SourceUnit]) -> Self {
        let src = diag.location().and_then(|location| {
            sources
                .iter()
                .find(|unit| unit.name() == location.unit())
                .map(|unit| (unit.name(), unit.source()))
        });
        Self { diag, src }
    }

    /// Name of the unit shown in the snippet, if any.
    pub fn unit(&self) -> Option<&str> {
        self.src.map(|(name, _)| name)
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .field("unit", &self.unit())
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message())?;
        if let Some(detail) = self.diag.detail() {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.diag.severity() {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.src
            .as_ref()
            .map(|(_, source)| source as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let (unit, _) = self.src?;
        let labels = self.diag.labels();
        if labels.is_empty() {
            return None;
        }

        Some(Box::new(
            labels
                .iter()
                .filter(move |label| label.location().unit() == unit)
                .map(|label| {
                    let span = span_to_miette(label.location().span());
                    let message = Some(label.message().to_string());
                    if label.is_primary() {
                        LabeledSpan::new_primary_with_span(message, span)
                    } else {
                        LabeledSpan::new_with_span(message, span)
                    }
                }),
        ))
    }
}

/// Adapter for non-diagnostic [`FabricError`] variants.
pub struct ErrorAdapter<'a>(pub &'a FabricError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            FabricError::Io(_) => "fabric::io",
            FabricError::Config(_) => "fabric::config",
            FabricError::Diagnostics { .. } => return None,
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A rich diagnostic with source location information.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn severity(&self) -> Option<miette::Severity> {
        match self {
            Reportable::Diagnostic(d) => d.severity(),
            Reportable::Error(e) => e.severity(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

fn span_to_miette(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Convert a [`FabricError`] into a list of reportable errors.
///
/// [`FabricError::Diagnostics`] yields one [`Reportable`] per diagnostic;
/// every other variant yields a single one.
pub fn to_reportables(err: &FabricError) -> Vec<Reportable<'_>> {
    match err {
        FabricError::Diagnostics {
            diagnostics,
            sources,
        } => diagnostics
            .iter()
            .map(|d| Reportable::Diagnostic(DiagnosticAdapter::new(d, sources)))
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fabric::{diagnostics::ErrorCode, span::SourceLocation};

    use super::*;

    fn at(unit: &str, range: std::ops::Range<usize>) -> SourceLocation {
        SourceLocation::new(Arc::from(unit), Span::new(range))
    }

    fn units() -> Vec<SourceUnit> {
        vec![
            SourceUnit::new("a.fabric", "document \"a\" { section ref { base = section.b } }"),
            SourceUnit::new("b.fabric", "section \"b\" { section ref { base = section.a } }"),
        ]
    }

    #[test]
    fn test_one_reportable_per_diagnostic() {
        let err = FabricError::new_diagnostics_error(
            vec![
                Diagnostic::error("Reference not found")
                    .with_code(ErrorCode::E300)
                    .with_label(at("a.fabric", 0..8), "here"),
                Diagnostic::error("Render cancelled").with_code(ErrorCode::E600),
            ],
            units(),
        );

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 2);
        assert_eq!(reportables[0].to_string(), "Reference not found");
        assert_eq!(reportables[1].to_string(), "Render cancelled");
    }

    #[test]
    fn test_detail_is_part_of_the_message() {
        let diag = Diagnostic::error("Circular reference detected")
            .with_code(ErrorCode::E301)
            .with_detail("section.a -> section.b -> section.a");
        let adapter = DiagnosticAdapter::new(&diag, &[]);

        assert_eq!(
            adapter.to_string(),
            "Circular reference detected: section.a -> section.b -> section.a"
        );
        assert_eq!(adapter.code().unwrap().to_string(), "E301");
    }

    #[test]
    fn test_source_follows_the_primary_label() {
        let sources = units();
        let diag = Diagnostic::error("Circular reference detected")
            .with_label(at("b.fabric", 15..26), "cycle closes here")
            .with_secondary_label(at("a.fabric", 15..26), "entered here")
            .with_secondary_label(at("b.fabric", 0..7), "target");

        let adapter = DiagnosticAdapter::new(&diag, &sources);

        assert_eq!(adapter.unit(), Some("b.fabric"));
        let labels: Vec<_> = adapter.labels().unwrap().collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].label(), Some("cycle closes here"));
        assert!(labels[0].primary());
        assert_eq!(labels[1].label(), Some("target"));
        assert!(!labels[1].primary());
    }

    #[test]
    fn test_unknown_unit_has_no_snippet() {
        let diag = Diagnostic::error("Reference not found").with_label(at("gone.fabric", 0..3), "x");
        let adapter = DiagnosticAdapter::new(&diag, &[]);

        assert!(adapter.unit().is_none());
        assert!(adapter.source_code().is_none());
        assert!(adapter.labels().is_none());
    }

    #[test]
    fn test_warning_severity_is_kept() {
        let diag = Diagnostic::warning("Potential data conflict").with_code(ErrorCode::E400);
        let adapter = DiagnosticAdapter::new(&diag, &[]);
        assert_eq!(adapter.severity(), Some(miette::Severity::Warning));
    }

    #[test]
    fn test_non_diagnostic_error() {
        let err = FabricError::Config("bad".to_string());

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 1);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "Configuration error: bad");
                assert_eq!(e.code().unwrap().to_string(), "fabric::config");
            }
            Reportable::Diagnostic(_) => panic!("Expected Error"),
        }
    }
}
