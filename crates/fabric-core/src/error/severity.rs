//! How far a diagnostic reaches into a render.

use std::fmt;

/// Severity of a [`Diagnostic`](super::Diagnostic).
///
/// An error means some output is missing: the node that raised it rendered
/// nothing, or for `E200`/`E202`/`E600` the rest of the render did. A warning
/// leaves the output complete but possibly not what the author meant, as with
/// a duplicated block key or a redefined data name.
///
/// Severities are ordered, `Warning < Error`, so the worst of a set of
/// diagnostics is their maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        *self == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        *self == Severity::Warning
    }

    /// Lowercase name, as shown in front of a rendered diagnostic.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
