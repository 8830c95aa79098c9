//! Fabric Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Fabric parser and
//! the rendering engine. It includes:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Blocks**: Block keys, definitions and attribute values ([`block`] module)
//! - **Spans**: Source positions within named source units ([`span`] module)
//! - **Errors**: The diagnostic system shared by every phase ([`error`] module)

pub mod block;
pub mod error;
pub mod identifier;
pub mod span;
