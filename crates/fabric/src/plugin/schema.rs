//! Argument schemas for plugins.
//!
//! Every plugin declares which configuration and invocation arguments it
//! accepts. Arguments are checked against the schema before the plugin is
//! called, so plugins only ever see well-formed input.

use std::fmt;

use serde_json::{Map, Value};

/// The JSON type an argument must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Bool,
    List,
    Map,
    Any,
}

impl ValueType {
    fn matches(self, value: &Value) -> bool {
        match self {
            ValueType::String => value.is_string(),
            ValueType::Number => value.is_number(),
            ValueType::Bool => value.is_boolean(),
            ValueType::List => value.is_array(),
            ValueType::Map => value.is_object(),
            ValueType::Any => true,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Bool => "bool",
            ValueType::List => "list",
            ValueType::Map => "map",
            ValueType::Any => "any",
        };
        f.write_str(name)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    name: &'static str,
    value_type: ValueType,
    required: bool,
}

/// A set of named, typed arguments.
///
/// # Example
///
/// ```
/// # use fabric::plugin::{Schema, ValueType};
/// # use serde_json::json;
/// let schema = Schema::new()
///     .required("path", ValueType::String)
///     .optional("strict", ValueType::Bool);
///
/// let args = json!({ "path": "people.json" });
/// assert!(schema.validate(args.as_object().unwrap()).is_ok());
///
/// let args = json!({ "strict": "yes" });
/// assert_eq!(schema.validate(args.as_object().unwrap()).unwrap_err().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// An empty schema: no arguments are accepted.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &'static str, value_type: ValueType) -> Self {
        self.fields.push(Field {
            name,
            value_type,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: &'static str, value_type: ValueType) -> Self {
        self.fields.push(Field {
            name,
            value_type,
            required: false,
        });
        self
    }

    /// Names of the declared arguments, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }

    /// Check `arguments`, returning one message per problem.
    pub fn validate(&self, arguments: &Map<String, Value>) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        for field in &self.fields {
            match arguments.get(field.name) {
                Some(value) if !field.value_type.matches(value) => problems.push(format!(
                    "`{}` must be a {}, found a {}",
                    field.name,
                    field.value_type,
                    json_type_name(value)
                )),
                Some(_) => {}
                None if field.required => {
                    problems.push(format!("missing required argument `{}`", field.name));
                }
                None => {}
            }
        }

        for name in arguments.keys() {
            if !self.fields.iter().any(|field| field.name == name) {
                problems.push(format!("unknown argument `{name}`"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_empty_schema_rejects_everything() {
        let problems = Schema::new().validate(&args(json!({ "x": 1 }))).unwrap_err();
        assert_eq!(problems, vec!["unknown argument `x`"]);
    }

    #[test]
    fn test_type_mismatch_and_missing() {
        let schema = Schema::new()
            .required("from", ValueType::String)
            .optional("columns", ValueType::List);

        let problems = schema.validate(&args(json!({ "columns": "a" }))).unwrap_err();
        assert_eq!(
            problems,
            vec![
                "missing required argument `from`",
                "`columns` must be a list, found a string",
            ]
        );
    }

    #[test]
    fn test_any_accepts_all_types() {
        let schema = Schema::new().required("value", ValueType::Any);
        assert!(schema.validate(&args(json!({ "value": [1, { "a": null }] }))).is_ok());
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["value"]);
    }
}
