//! Block keys, block definitions and attribute values.
//!
//! A Fabric source unit is a sequence of blocks. Every block has a
//! [`BlockKind`], an optional type tag (`text`, `ref`, `list`, ...), an
//! optional name, an ordered attribute set and, for container kinds, ordered
//! child blocks. Definitions are immutable once parsed and shared through
//! [`Arc`] so a catalog can hand them out to any number of concurrent renders.
//!
//! # Example
//!
//! ```
//! # use fabric_core::block::{AttributeValue, BlockDefinition, BlockKey, BlockKind};
//! # use fabric_core::identifier::Id;
//! let leaf = BlockDefinition::new(BlockKind::Content, Some(Id::new("text")), Some(Id::new("hello")))
//!     .with_attribute("value", AttributeValue::from("Hello"));
//!
//! let key: BlockKey = "content.text.hello".parse().unwrap();
//! assert_eq!(leaf.key(), key);
//! ```

use std::{fmt, str::FromStr, sync::Arc};

use indexmap::IndexMap;
use serde_json::{Number, Value};
use thiserror::Error;

use crate::{identifier::Id, span::SourceLocation};

/// Attribute names with a meaning to the renderer itself.
pub mod attr {
    /// Heading emitted before the block body.
    pub const TITLE: &str = "title";
    /// Target of a `ref` block.
    pub const BASE: &str = "base";
    /// Output transformation applied to the rendered block.
    pub const FORMAT_AS: &str = "format_as";
    /// Literal text of a `content text` block.
    pub const VALUE: &str = "value";
}

/// Type tag of reference blocks.
pub const REF_TYPE: &str = "ref";

/// Type tag of literal text blocks.
pub const TEXT_TYPE: &str = "text";

/// Ordered attribute set.
pub type Attributes = IndexMap<String, AttributeValue>;

/// The four kinds of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockKind {
    Document,
    Section,
    Content,
    Data,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Document => "document",
            BlockKind::Section => "section",
            BlockKind::Content => "content",
            BlockKind::Data => "data",
        }
    }

    /// Content and data blocks always carry a type tag.
    pub fn requires_type(&self) -> bool {
        matches!(self, BlockKind::Content | BlockKind::Data)
    }

    /// Documents and sections own ordered children.
    pub fn is_container(&self) -> bool {
        matches!(self, BlockKind::Document | BlockKind::Section)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockKind {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(BlockKind::Document),
            "section" => Ok(BlockKind::Section),
            "content" => Ok(BlockKind::Content),
            "data" => Ok(BlockKind::Data),
            other => Err(KeyParseError::UnknownKind(other.to_string())),
        }
    }
}

/// Errors produced when parsing a reference path such as `content.text.intro`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("unknown block kind `{0}`")]
    UnknownKind(String),

    #[error("malformed reference `{0}`: expected `<kind>.<type>.<name>` or `<kind>.<name>`")]
    Malformed(String),

    #[error("`{kind}` blocks must be referenced as `{kind}.<type>.<name>`")]
    MissingType { kind: BlockKind },
}

/// The identity of a block: `(kind, type, name)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockKey {
    kind: BlockKind,
    block_type: Option<Id>,
    name: Option<Id>,
}

impl BlockKey {
    pub fn new(kind: BlockKind, block_type: Option<Id>, name: Option<Id>) -> Self {
        Self {
            kind,
            block_type,
            name,
        }
    }

    /// Key of a named document.
    pub fn document(name: &str) -> Self {
        Self::new(BlockKind::Document, None, Some(Id::new(name)))
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn block_type(&self) -> Option<Id> {
        self.block_type
    }

    pub fn name(&self) -> Option<Id> {
        self.name
    }

    /// Anonymous blocks are addressable only positionally.
    pub fn is_addressable(&self) -> bool {
        self.name.is_some()
    }

    pub fn is_ref(&self) -> bool {
        self.block_type.is_some_and(|t| t == REF_TYPE)
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(block_type) = self.block_type {
            write!(f, ".{block_type}")?;
        }
        match self.name {
            Some(name) => write!(f, ".{name}"),
            None => write!(f, ".<anonymous>"),
        }
    }
}

impl FromStr for BlockKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split('.').collect();
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(KeyParseError::Malformed(s.to_string()));
        }

        let kind: BlockKind = segments[0].trim().parse()?;
        match segments.as_slice() {
            [_, name] => {
                if kind.requires_type() {
                    return Err(KeyParseError::MissingType { kind });
                }
                Ok(Self::new(kind, None, Some(Id::new(name.trim()))))
            }
            [_, block_type, name] => Ok(Self::new(
                kind,
                Some(Id::new(block_type.trim())),
                Some(Id::new(name.trim())),
            )),
            _ => Err(KeyParseError::Malformed(s.to_string())),
        }
    }
}

/// An attribute value as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<AttributeValue>),
    Map(Attributes),
    /// A bare `<kind>.<type>.<name>` path.
    Reference(BlockKey),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Interpret the value as a block reference.
    ///
    /// Quoted strings holding a reference path are accepted as well.
    pub fn as_reference(&self) -> Option<Result<BlockKey, KeyParseError>> {
        match self {
            AttributeValue::Reference(key) => Some(Ok(*key)),
            AttributeValue::String(path) => Some(path.parse()),
            _ => None,
        }
    }

    /// Short name of the value's type, used in schema diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "string",
            AttributeValue::Number(_) => "number",
            AttributeValue::Bool(_) => "bool",
            AttributeValue::List(_) => "list",
            AttributeValue::Map(_) => "map",
            AttributeValue::Reference(_) => "reference",
        }
    }

    /// Convert into the JSON value model handed to plugins.
    pub fn to_json(&self) -> Value {
        match self {
            AttributeValue::String(value) => Value::String(value.clone()),
            AttributeValue::Number(value) => number_to_json(*value),
            AttributeValue::Bool(value) => Value::Bool(*value),
            AttributeValue::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            AttributeValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            AttributeValue::Reference(key) => Value::String(key.to_string()),
        }
    }
}

fn number_to_json(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::Number(Number::from(value as i64))
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<BlockKey> for AttributeValue {
    fn from(key: BlockKey) -> Self {
        AttributeValue::Reference(key)
    }
}

/// Convert an attribute set into a JSON object.
pub fn attributes_to_json(attributes: &Attributes) -> serde_json::Map<String, Value> {
    attributes
        .iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect()
}

/// An immutable, parsed block.
#[derive(Debug, Clone)]
pub struct BlockDefinition {
    kind: BlockKind,
    block_type: Option<Id>,
    name: Option<Id>,
    attributes: Attributes,
    config: Attributes,
    meta: Attributes,
    children: Vec<Arc<BlockDefinition>>,
    location: Option<SourceLocation>,
}

impl BlockDefinition {
    pub fn new(kind: BlockKind, block_type: Option<Id>, name: Option<Id>) -> Self {
        Self {
            kind,
            block_type,
            name,
            attributes: Attributes::new(),
            config: Attributes::new(),
            meta: Attributes::new(),
            children: Vec::new(),
            location: None,
        }
    }

    /// Set an attribute, replacing any previous value.
    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Set the plugin configuration attributes.
    pub fn with_config(mut self, config: Attributes) -> Self {
        self.config = config;
        self
    }

    /// Set the document metadata attributes.
    pub fn with_meta(mut self, meta: Attributes) -> Self {
        self.meta = meta;
        self
    }

    /// Append a child block.
    pub fn with_child(mut self, child: impl Into<Arc<BlockDefinition>>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn key(&self) -> BlockKey {
        BlockKey::new(self.kind, self.block_type, self.name)
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn block_type(&self) -> Option<Id> {
        self.block_type
    }

    pub fn name(&self) -> Option<Id> {
        self.name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn config(&self) -> &Attributes {
        &self.config
    }

    pub fn meta(&self) -> &Attributes {
        &self.meta
    }

    pub fn children(&self) -> &[Arc<BlockDefinition>] {
        &self.children
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    pub fn title(&self) -> Option<&str> {
        self.attribute(attr::TITLE).and_then(AttributeValue::as_str)
    }

    pub fn is_ref(&self) -> bool {
        self.key().is_ref()
    }

    /// Whether this is a literal `content text` block.
    pub fn is_text(&self) -> bool {
        self.kind == BlockKind::Content && self.block_type.is_some_and(|t| t == TEXT_TYPE)
    }
}
