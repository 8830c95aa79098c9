//! Error types for Fabric operations.
//!
//! Rendering itself never fails with a Rust error: problems are reported as
//! [`Diagnostic`]s in the render output. [`FabricError`] covers the
//! surrounding work, such as reading files, loading configuration and turning
//! an erroneous render into a single reportable failure.

use std::io;

use thiserror::Error;

use fabric_core::error::Diagnostic;

use crate::source::SourceUnit;

/// The main error type for Fabric operations.
///
/// # Diagnostic Variants
///
/// The `Diagnostics` variant carries every diagnostic of a render together
/// with the source units they point into, so reporters can show labelled
/// source snippets.
#[derive(Debug, Error)]
pub enum FabricError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{}", summarize(.diagnostics))]
    Diagnostics {
        diagnostics: Vec<Diagnostic>,
        sources: Vec<SourceUnit>,
    },
}

impl FabricError {
    /// Create a new `Diagnostics` error with the units the diagnostics refer to.
    pub fn new_diagnostics_error(diagnostics: Vec<Diagnostic>, sources: Vec<SourceUnit>) -> Self {
        Self::Diagnostics {
            diagnostics,
            sources,
        }
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    let errors = diagnostics
        .iter()
        .filter(|diag| diag.severity().is_error())
        .count();
    match diagnostics.iter().find(|diag| diag.severity().is_error()) {
        Some(first) if errors > 1 => format!("{first} (+{} more errors)", errors - 1),
        Some(first) => first.to_string(),
        None => "render produced no errors".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use fabric_core::error::ErrorCode;

    use super::*;

    #[test]
    fn test_diagnostics_display_counts_errors_only() {
        let err = FabricError::new_diagnostics_error(
            vec![
                Diagnostic::warning("Potential data conflict").with_code(ErrorCode::E400),
                Diagnostic::error("Reference not found").with_code(ErrorCode::E300),
                Diagnostic::error("Circular reference detected").with_code(ErrorCode::E301),
            ],
            Vec::new(),
        );

        assert_eq!(
            err.to_string(),
            "error[E300]: Reference not found (+1 more errors)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let err: FabricError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(err.to_string().starts_with("I/O error"));
    }
}
