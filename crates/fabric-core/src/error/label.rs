//! Labeled source locations for diagnostic messages.

use crate::span::SourceLocation;

/// A message attached to a location in a source unit.
///
/// - **Primary labels** mark the main location of an error or warning.
/// - **Secondary labels** add context such as "first defined here".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    location: SourceLocation,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a new primary label.
    pub fn primary(location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a new secondary label.
    pub fn secondary(location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
            is_primary: false,
        }
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::span::Span;

    #[test]
    fn test_primary_label() {
        let location = SourceLocation::new(Arc::from("a.fabric"), Span::new(10..20));
        let label = Label::primary(location, "error here");

        assert_eq!(label.location().span().start(), 10);
        assert_eq!(label.location().unit(), "a.fabric");
        assert_eq!(label.message(), "error here");
        assert!(label.is_primary());
        assert!(!label.is_secondary());
    }

    #[test]
    fn test_secondary_label() {
        let location = SourceLocation::new(Arc::from("b.fabric"), Span::new(5..15));
        let label = Label::secondary(location, "first defined here");

        assert_eq!(label.location().span().end(), 15);
        assert!(label.is_secondary());
    }
}
