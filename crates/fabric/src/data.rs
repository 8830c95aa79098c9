//! The per-render data context.
//!
//! Data blocks evaluate to JSON values that are stored here under the block's
//! name. Content plugins and `${...}` interpolation read from the context.

use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use fabric_core::{
    block::BlockDefinition,
    error::{Diagnostic, DiagnosticSink, ErrorCode},
};

use crate::plugin::{InvocationContext, PluginRegistry};

/// Ordered map from data name to value, owned by a single render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataContext {
    values: IndexMap<String, Value>,
}

impl DataContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    /// Data names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The whole context as one JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }
}

impl FromIterator<(String, Value)> for DataContext {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Evaluates data blocks and folds their values into a [`DataContext`].
#[derive(Debug, Clone, Copy)]
pub struct DataContextBuilder<'a> {
    plugins: &'a PluginRegistry,
    invocation: InvocationContext<'a>,
}

impl<'a> DataContextBuilder<'a> {
    pub fn new(plugins: &'a PluginRegistry, invocation: InvocationContext<'a>) -> Self {
        Self {
            plugins,
            invocation,
        }
    }

    /// Evaluate `block` through its plugin and store the value under `name`.
    ///
    /// A name that is already taken raises a "Potential data conflict"
    /// warning; the new value replaces the old one. Returns the stored value,
    /// or `None` when the plugin call failed.
    pub fn apply(
        &self,
        block: &BlockDefinition,
        name: &str,
        context: &mut DataContext,
        sink: &mut DiagnosticSink,
    ) -> Option<Value> {
        let value = self.plugins.invoke(block, context, self.invocation, sink)?;
        merge(context, name, value.clone(), block, sink);
        Some(value)
    }
}

/// Insert `value` under `name`, warning if the name was already present.
pub(crate) fn merge(
    context: &mut DataContext,
    name: &str,
    value: Value,
    block: &BlockDefinition,
    sink: &mut DiagnosticSink,
) {
    if context.insert(name, value).is_some() {
        debug!(name; "Data name reused");
        sink.emit(
            Diagnostic::warning("Potential data conflict")
                .with_code(ErrorCode::E400)
                .with_detail(format!(
                    "data `{name}` is defined more than once; the later value is used"
                ))
                .with_optional_label(block.location(), "redefined here"),
        );
    }
}

/// The diagnostic for a data block that cannot be stored for lack of a name.
pub(crate) fn anonymous_data(block: &BlockDefinition) -> Diagnostic {
    Diagnostic::error("Anonymous data block")
        .with_code(ErrorCode::E401)
        .with_detail(format!(
            "`{}` data needs a name to be stored in the data context",
            block.block_type().map_or_else(String::new, |t| t.to_string())
        ))
        .with_optional_label(block.location(), "unnamed data block")
        .with_help("give the block a name: `data <type> \"name\" { ... }`")
}

#[cfg(test)]
mod tests {
    use fabric_core::{
        block::{AttributeValue, BlockKind},
        identifier::Id,
    };
    use serde_json::json;

    use super::*;

    fn inline(name: &str, value: &str) -> BlockDefinition {
        BlockDefinition::new(BlockKind::Data, Some(Id::new("inline")), Some(Id::new(name)))
            .with_attribute("value", AttributeValue::from(value))
    }

    #[test]
    fn test_apply_inserts_value() {
        let registry = PluginRegistry::builtin();
        let builder = DataContextBuilder::new(&registry, InvocationContext::default());
        let mut context = DataContext::new();
        let mut sink = DiagnosticSink::new();

        let value = builder.apply(&inline("greeting", "hi"), "greeting", &mut context, &mut sink);

        assert_eq!(value, Some(json!("hi")));
        assert_eq!(context.get("greeting"), Some(&json!("hi")));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_conflict_keeps_last_value_and_warns() {
        let registry = PluginRegistry::builtin();
        let builder = DataContextBuilder::new(&registry, InvocationContext::default());
        let mut context = DataContext::new();
        let mut sink = DiagnosticSink::new();

        builder.apply(&inline("x", "first"), "x", &mut context, &mut sink);
        builder.apply(&inline("x", "second"), "x", &mut context, &mut sink);

        assert_eq!(context.get("x"), Some(&json!("second")));
        assert_eq!(sink.len(), 1);
        let warning = &sink.diagnostics()[0];
        assert!(warning.severity().is_warning());
        assert_eq!(warning.message(), "Potential data conflict");
        assert!(!sink.has_errors());
    }

    #[test]
    fn test_names_keep_insertion_order() {
        let context: DataContext = [
            ("zeta".to_string(), json!(1)),
            ("alpha".to_string(), json!(2)),
        ]
        .into_iter()
        .collect();

        assert_eq!(context.names().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(context.to_json(), json!({ "zeta": 1, "alpha": 2 }));
    }
}
