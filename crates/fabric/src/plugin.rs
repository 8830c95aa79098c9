//! The plugin boundary.
//!
//! Content and data blocks whose type is not handled by the assembler itself
//! are evaluated by plugins. A [`Plugin`] advertises one or more
//! [`PluginDescriptor`]s; the [`PluginRegistry`] picks the highest version
//! for every `(kind, type)` pair once, when it is built, and then validates
//! arguments against the descriptor's schemas before every call.
//!
//! # Example
//!
//! ```
//! # use fabric::plugin::{Plugin, PluginCall, PluginDescriptor, PluginRegistry, Schema, ValueType};
//! # use fabric_core::{block::BlockKind, error::Diagnostic};
//! # use serde_json::{Value, json};
//! struct Shout;
//!
//! impl Plugin for Shout {
//!     fn descriptors(&self) -> Vec<PluginDescriptor> {
//!         vec![PluginDescriptor::new("demo", BlockKind::Content, "shout", "1.0.0".parse().unwrap())
//!             .with_invocation_schema(Schema::new().required("text", ValueType::String))]
//!     }
//!
//!     fn invoke(&self, call: &PluginCall<'_>) -> Result<Value, Vec<Diagnostic>> {
//!         let text = call.argument("text").and_then(Value::as_str).unwrap_or_default();
//!         Ok(json!(text.to_uppercase()))
//!     }
//! }
//!
//! let registry = PluginRegistry::builtin().with_plugin(Shout);
//! assert!(registry.lookup(BlockKind::Content, "shout").is_some());
//! ```

mod builtin;
mod schema;

pub use builtin::{ContentCode, ContentList, ContentTable, DataInline, DataJson};
pub(crate) use builtin::value_to_text;
pub use schema::{Schema, ValueType};

use std::{cmp::Ordering, collections::HashMap, fmt, path::Path, str::FromStr, sync::Arc};

use log::{debug, trace};
use serde_json::{Map, Value};
use thiserror::Error;

use fabric_core::{
    block::{BlockDefinition, BlockKind, attr, attributes_to_json},
    error::{Diagnostic, DiagnosticSink, ErrorCode},
};

use crate::data::DataContext;

/// A plugin version, `major.minor.patch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version `{0}`: expected `major.minor.patch`")]
pub struct VersionParseError(String);

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(VersionParseError(s.to_string()));
        };
        let parse = |part: &str| {
            part.parse::<u64>()
                .map_err(|_| VersionParseError(s.to_string()))
        };
        Ok(Self::new(parse(major)?, parse(minor)?, parse(patch)?))
    }
}

/// What a plugin provides: one block type of one kind, at one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    namespace: String,
    kind: BlockKind,
    name: String,
    version: Version,
    config_schema: Schema,
    invocation_schema: Schema,
}

impl PluginDescriptor {
    /// A descriptor accepting no configuration and no arguments.
    pub fn new(
        namespace: impl Into<String>,
        kind: BlockKind,
        name: impl Into<String>,
        version: Version,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            kind,
            name: name.into(),
            version,
            config_schema: Schema::new(),
            invocation_schema: Schema::new(),
        }
    }

    pub fn with_config_schema(mut self, schema: Schema) -> Self {
        self.config_schema = schema;
        self
    }

    pub fn with_invocation_schema(mut self, schema: Schema) -> Self {
        self.invocation_schema = schema;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    /// The block type this plugin evaluates.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn config_schema(&self) -> &Schema {
        &self.config_schema
    }

    pub fn invocation_schema(&self) -> &Schema {
        &self.invocation_schema
    }
}

/// Render-wide inputs every plugin call receives.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvocationContext<'a> {
    base_dir: Option<&'a Path>,
}

impl<'a> InvocationContext<'a> {
    pub fn new(base_dir: Option<&'a Path>) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> Option<&'a Path> {
        self.base_dir
    }
}

/// One validated plugin call.
#[derive(Debug)]
pub struct PluginCall<'a> {
    descriptor: &'a PluginDescriptor,
    block: &'a BlockDefinition,
    config: Map<String, Value>,
    arguments: Map<String, Value>,
    data: &'a DataContext,
    context: InvocationContext<'a>,
}

impl<'a> PluginCall<'a> {
    /// The descriptor the call was dispatched on.
    pub fn descriptor(&self) -> &PluginDescriptor {
        self.descriptor
    }

    pub fn block(&self) -> &BlockDefinition {
        self.block
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub fn arguments(&self) -> &Map<String, Value> {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    /// The data context as it stands at the time of the call.
    pub fn data(&self) -> &DataContext {
        self.data
    }

    /// Directory relative paths are resolved against, if configured.
    pub fn base_dir(&self) -> Option<&Path> {
        self.context.base_dir()
    }

    /// An error diagnostic pointing at the block being evaluated.
    pub fn error(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::error(message)
            .with_code(ErrorCode::E500)
            .with_optional_label(self.block.location(), "while evaluating this block")
    }
}

/// An in-process plugin.
pub trait Plugin: Send + Sync {
    /// Everything this plugin can evaluate.
    fn descriptors(&self) -> Vec<PluginDescriptor>;

    /// Evaluate one block. `call.descriptor()` tells which of the
    /// plugin's descriptors was selected.
    fn invoke(&self, call: &PluginCall<'_>) -> Result<Value, Vec<Diagnostic>>;
}

struct Entry {
    descriptor: PluginDescriptor,
    plugin: Arc<dyn Plugin>,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Maps `(kind, type)` to the highest-versioned plugin providing it.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    entries: HashMap<(BlockKind, String), Entry>,
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the builtin plugins.
    pub fn builtin() -> Self {
        Self::new()
            .with_plugin(DataInline)
            .with_plugin(DataJson)
            .with_plugin(ContentList)
            .with_plugin(ContentTable)
            .with_plugin(ContentCode)
    }

    /// Register every descriptor of `plugin`.
    ///
    /// A descriptor replaces an existing entry only if its version is higher.
    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.register(Arc::new(plugin));
        self
    }

    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        for descriptor in plugin.descriptors() {
            let slot = (descriptor.kind(), descriptor.name().to_string());
            let replace = self.entries.get(&slot).is_none_or(|existing| {
                descriptor.version().cmp(&existing.descriptor.version()) == Ordering::Greater
            });

            if replace {
                debug!(
                    namespace = descriptor.namespace(),
                    kind = descriptor.kind().as_str(),
                    name = descriptor.name(),
                    version = descriptor.version().to_string();
                    "Registering plugin",
                );
                self.entries.insert(
                    slot,
                    Entry {
                        descriptor,
                        plugin: Arc::clone(&plugin),
                    },
                );
            }
        }
    }

    /// The selected descriptor for `kind` and block type `name`.
    pub fn lookup(&self, kind: BlockKind, name: &str) -> Option<&PluginDescriptor> {
        self.entries
            .get(&(kind, name.to_string()))
            .map(|entry| &entry.descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate and dispatch a call for `block`.
    ///
    /// Returns `None` after emitting diagnostics when no plugin matches, the
    /// arguments do not fit the schema, or the plugin reports failure. In the
    /// first two cases the plugin is never called.
    pub fn invoke(
        &self,
        block: &BlockDefinition,
        data: &DataContext,
        context: InvocationContext<'_>,
        sink: &mut DiagnosticSink,
    ) -> Option<Value> {
        let Some(block_type) = block.block_type().map(|block_type| block_type.to_string()) else {
            sink.emit(
                Diagnostic::error("Plugin not found")
                    .with_code(ErrorCode::E501)
                    .with_detail(format!("`{}` block has no type to dispatch on", block.kind()))
                    .with_optional_label(block.location(), "untyped block")
                    .with_help(format!("write the block as `{} <type> {{ ... }}`", block.kind())),
            );
            return None;
        };
        let Some(entry) = self.entries.get(&(block.kind(), block_type.clone())) else {
            sink.emit(
                Diagnostic::error("Plugin not found")
                    .with_code(ErrorCode::E501)
                    .with_detail(format!(
                        "no plugin provides `{} {block_type}` blocks",
                        block.kind()
                    ))
                    .with_optional_label(block.location(), "unknown block type"),
            );
            return None;
        };

        let config = attributes_to_json(block.config());
        let mut arguments = attributes_to_json(block.attributes());
        arguments.remove(attr::TITLE);
        arguments.remove(attr::FORMAT_AS);

        let descriptor = &entry.descriptor;
        let problems: Vec<String> = [
            descriptor.config_schema().validate(&config).err(),
            descriptor.invocation_schema().validate(&arguments).err(),
        ]
        .into_iter()
        .flatten()
        .flatten()
        .collect();
        if !problems.is_empty() {
            sink.emit(
                Diagnostic::error("Invalid plugin arguments")
                    .with_code(ErrorCode::E502)
                    .with_detail(problems.join("; "))
                    .with_optional_label(block.location(), "in this block")
                    .with_help(format!(
                        "`{} {block_type}` accepts: {}",
                        block.kind(),
                        describe_schema(descriptor.invocation_schema())
                    )),
            );
            return None;
        }

        let call = PluginCall {
            descriptor,
            block,
            config,
            arguments,
            data,
            context,
        };
        trace!(plugin = block_type.as_str(), version = descriptor.version().to_string(); "Invoking plugin");

        match entry.plugin.invoke(&call) {
            Ok(value) => Some(value),
            Err(diagnostics) => {
                if diagnostics.is_empty() {
                    sink.emit(call.error("Plugin invocation failed"));
                }
                for diagnostic in diagnostics {
                    sink.emit(normalize_plugin_diagnostic(diagnostic, block));
                }
                None
            }
        }
    }
}

fn describe_schema(schema: &Schema) -> String {
    let names: Vec<String> = schema.field_names().map(|name| format!("`{name}`")).collect();
    if names.is_empty() {
        "no arguments".to_string()
    } else {
        names.join(", ")
    }
}

/// Plugin diagnostics always carry a code and point at the evaluated block.
fn normalize_plugin_diagnostic(diagnostic: Diagnostic, block: &BlockDefinition) -> Diagnostic {
    let diagnostic = if diagnostic.code().is_none() {
        diagnostic.with_code(ErrorCode::E500)
    } else {
        diagnostic
    };
    if diagnostic.labels().is_empty() {
        diagnostic.with_optional_label(block.location(), "while evaluating this block")
    } else {
        diagnostic
    }
}
