//! Diagnostic system shared by the Fabric parser and renderer.
//!
//! This module provides:
//! - Error codes for documentation and searchability
//! - Labeled source locations for rich error context
//! - Severity levels
//! - An append-only [`DiagnosticSink`] that accumulates diagnostics across a
//!   whole render without halting unrelated work
//!
//! # Example
//!
//! ```
//! # use std::sync::Arc;
//! # use fabric_core::error::{Diagnostic, DiagnosticSink, ErrorCode};
//! # use fabric_core::span::{SourceLocation, Span};
//! let location = SourceLocation::new(Arc::from("main.fabric"), Span::new(10..32));
//!
//! let mut sink = DiagnosticSink::new();
//! sink.emit(
//!     Diagnostic::error("Reference not found")
//!         .with_code(ErrorCode::E300)
//!         .with_detail("block `content.text.missing` is not defined in any source unit")
//!         .with_label(location, "referenced here"),
//! );
//!
//! assert!(sink.has_errors());
//! ```

mod diagnostic;
mod error_code;
mod label;
mod severity;
mod sink;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use severity::Severity;
pub use sink::DiagnosticSink;
