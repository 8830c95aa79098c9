//! # Fabric Parser
//!
//! Parser for the Fabric block language. This crate turns the text of one
//! source unit into immutable [`BlockDefinition`]s ready to be merged into a
//! catalog.
//!
//! ## Usage
//!
//! ```
//! # use fabric_parser::{parse, ParseError};
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         document "greeting" {
//!             title = "Welcome"
//!             content text {
//!                 value = "Hello from fabric"
//!             }
//!         }
//!     "#;
//!
//!     let blocks = parse("greeting.fabric", source)?;
//!     assert_eq!(blocks.len(), 1);
//!     assert_eq!(blocks[0].children().len(), 1);
//!     Ok(())
//! }
//! ```

mod build;
mod error;
mod parser;
mod parser_types;

pub use error::ParseError;

use std::sync::Arc;

use log::{debug, info};

use fabric_core::block::BlockDefinition;

use build::Builder;

/// Parse one source unit into its top-level block definitions.
///
/// The pipeline has two steps:
///
/// 1. **Parse** - Build the raw block tree from source text
/// 2. **Build** - Validate structure and produce [`BlockDefinition`]s
///
/// # Arguments
///
/// * `unit` - Name of the source unit, used in every diagnostic location
/// * `source` - The unit's text
///
/// # Errors
///
/// Returns a [`ParseError`] holding every diagnostic found. A syntax error
/// stops parsing at the first failure; structural errors are all collected.
pub fn parse(unit: &str, source: &str) -> Result<Vec<Arc<BlockDefinition>>, ParseError> {
    info!(unit; "Parsing source unit");
    let unit: Arc<str> = Arc::from(unit);

    let raw = parser::parse_unit(&unit, source)?;
    debug!(blocks = raw.len(); "Parsed raw blocks");

    let blocks = Builder::new(&unit).build(&raw)?;
    debug!(blocks = blocks.len(); "Built block definitions");

    Ok(blocks)
}
