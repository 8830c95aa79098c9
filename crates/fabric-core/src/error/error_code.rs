//! Error codes for the Fabric diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E1xx` - Parser errors
//! - `E2xx` - Catalog errors
//! - `E3xx` - Reference resolution errors
//! - `E4xx` - Data context errors
//! - `E5xx` - Plugin and interpolation errors
//! - `E6xx` - Assembly errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected input.
    ///
    /// The parser encountered input it did not expect at this position.
    E100,

    /// Invalid reference path.
    ///
    /// A bare path did not have the shape `<kind>.<type>.<name>` or
    /// `<kind>.<name>`.
    E101,

    /// Duplicate attribute.
    ///
    /// The same attribute was set twice in one block body.
    E102,

    // =========================================================================
    // Catalog Errors (E2xx)
    // =========================================================================
    /// No source units.
    ///
    /// The render was started without any source unit at all.
    E200,

    /// Duplicate block definition.
    ///
    /// Two blocks share the same `(kind, type, name)`; the first one wins.
    E201,

    /// Document not found.
    ///
    /// The requested root document is not defined in any source unit.
    E202,

    // =========================================================================
    // Resolution Errors (E3xx)
    // =========================================================================
    /// Reference not found.
    E300,

    /// Circular reference.
    ///
    /// A reference chain leads back to a block that is still being resolved.
    E301,

    /// Reference kind mismatch.
    ///
    /// A `content ref` pointed at a section, a `section ref` at data, etc.
    E302,

    /// Reference without target.
    ///
    /// A `ref` block has no usable `base` attribute.
    E303,

    // =========================================================================
    // Data Errors (E4xx)
    // =========================================================================
    /// Potential data conflict.
    ///
    /// Two data computations were bound to the same name.
    E400,

    /// Anonymous data block.
    ///
    /// Data blocks need a name to be stored in the data context.
    E401,

    // =========================================================================
    // Plugin Errors (E5xx)
    // =========================================================================
    /// Plugin invocation failed.
    E500,

    /// No plugin provides this block type.
    E501,

    /// Block attributes do not match the plugin schema.
    E502,

    /// Expression interpolation failed.
    E503,

    // =========================================================================
    // Assembly Errors (E6xx)
    // =========================================================================
    /// Render cancelled or deadline exceeded.
    E600,

    /// Unknown output transformation.
    E601,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E301").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E400 => "E400",
            ErrorCode::E401 => "E401",
            ErrorCode::E500 => "E500",
            ErrorCode::E501 => "E501",
            ErrorCode::E502 => "E502",
            ErrorCode::E503 => "E503",
            ErrorCode::E600 => "E600",
            ErrorCode::E601 => "E601",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "unexpected input",
            ErrorCode::E101 => "invalid reference path",
            ErrorCode::E102 => "duplicate attribute",
            ErrorCode::E200 => "no source units",
            ErrorCode::E201 => "duplicate block definition",
            ErrorCode::E202 => "document not found",
            ErrorCode::E300 => "reference not found",
            ErrorCode::E301 => "circular reference",
            ErrorCode::E302 => "reference kind mismatch",
            ErrorCode::E303 => "reference without target",
            ErrorCode::E400 => "potential data conflict",
            ErrorCode::E401 => "anonymous data block",
            ErrorCode::E500 => "plugin invocation failed",
            ErrorCode::E501 => "plugin not found",
            ErrorCode::E502 => "invalid plugin arguments",
            ErrorCode::E503 => "interpolation failed",
            ErrorCode::E600 => "render cancelled",
            ErrorCode::E601 => "unknown transformation",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
