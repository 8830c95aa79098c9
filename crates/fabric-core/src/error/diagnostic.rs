//! The core diagnostic type.
//!
//! A [`Diagnostic`] represents a single error or warning with a severity, an
//! optional error code, a one-line summary, optional longer detail, labeled
//! source locations and help text.

use std::fmt;

use crate::{
    error::{ErrorCode, Label, Severity},
    span::SourceLocation,
};

/// A structured error or warning attached to a render.
///
/// # Example
///
/// ```text
/// error[E301]: Circular reference detected
///   --> chapters.fabric:12:3
///    |
/// 12 |   content ref "ref_c" { base = content.ref.ref_a }
///    |   ------------------------------------------------ cycle closes here
///    |
///    = content.ref.ref_a -> content.ref.ref_b -> content.ref.ref_c -> content.ref.ref_a
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    detail: Option<String>,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// The one-line summary.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Longer explanation, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Location of the first primary label.
    pub fn location(&self) -> Option<&SourceLocation> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::location)
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, location: SourceLocation, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(location, message));
        self
    }

    /// Add a primary label when a location is known.
    pub fn with_optional_label(
        self,
        location: Option<&SourceLocation>,
        message: impl Into<String>,
    ) -> Self {
        match location {
            Some(location) => self.with_label(location.clone(), message),
            None => self,
        }
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(
        mut self,
        location: SourceLocation,
        message: impl Into<String>,
    ) -> Self {
        self.labels.push(Label::secondary(location, message));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            detail: None,
            labels: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // "error[E301]: message" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}
