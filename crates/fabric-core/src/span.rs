//! Source positions.
//!
//! A [`Span`] is a byte range inside one source unit; a [`SourceLocation`]
//! pairs it with the name of the unit so diagnostics stay meaningful once
//! blocks from many units are merged into one catalog.

use std::{fmt, ops::Range, sync::Arc};

/// A byte range within a single source unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a new span from a byte range.
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end.max(range.start),
        }
    }

    /// Get the start offset of the span.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Get the end offset of the span.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Get the length of the span.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Create a union of two spans (encompassing both).
    pub fn union(&self, other: Span) -> Span {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range)
    }
}

/// Where a block or value was declared: unit name plus byte span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    unit: Arc<str>,
    span: Span,
}

impl SourceLocation {
    pub fn new(unit: Arc<str>, span: Span) -> Self {
        Self { unit, span }
    }

    /// Name of the source unit.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}..{}", self.unit, self.span.start, self.span.end)
    }
}
