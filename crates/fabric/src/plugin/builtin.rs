//! Plugins shipped with Fabric.
//!
//! | block            | arguments                                   |
//! |------------------|---------------------------------------------|
//! | `data inline`    | `value`                                     |
//! | `data json`      | `path`, relative to the plugin base dir     |
//! | `content list`   | `items` or `from`, optional `format`        |
//! | `content table`  | `from`, optional `columns`                  |
//! | `content code`   | `value` or `from`, optional `language`      |

use std::{fs, path::PathBuf};

use log::debug;
use serde_json::{Value, json};

use fabric_core::{block::BlockKind, error::Diagnostic};

use super::{PluginCall, PluginDescriptor, Schema, ValueType, Version};

const NAMESPACE: &str = "builtin";

fn version() -> Version {
    Version::new(0, 1, 0)
}

/// Text form of a JSON value: strings verbatim, everything else serialized.
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Look up the data value named by the `from` argument.
fn from_data<'c>(call: &'c PluginCall<'_>) -> Result<Option<&'c Value>, Vec<Diagnostic>> {
    let Some(name) = call.argument("from").and_then(Value::as_str) else {
        return Ok(None);
    };
    call.data().get(name).map(Some).ok_or_else(|| {
        vec![
            call.error(format!("no data named `{name}`"))
                .with_help("define a data block with this name before the block that uses it"),
        ]
    })
}

/// `data inline`: the `value` argument as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataInline;

impl super::Plugin for DataInline {
    fn descriptors(&self) -> Vec<PluginDescriptor> {
        vec![
            PluginDescriptor::new(NAMESPACE, BlockKind::Data, "inline", version())
                .with_invocation_schema(Schema::new().required("value", ValueType::Any)),
        ]
    }

    fn invoke(&self, call: &PluginCall<'_>) -> Result<Value, Vec<Diagnostic>> {
        Ok(call.argument("value").cloned().unwrap_or(Value::Null))
    }
}

/// `data json`: parse a JSON file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataJson;

impl super::Plugin for DataJson {
    fn descriptors(&self) -> Vec<PluginDescriptor> {
        vec![
            PluginDescriptor::new(NAMESPACE, BlockKind::Data, "json", version())
                .with_invocation_schema(Schema::new().required("path", ValueType::String)),
        ]
    }

    fn invoke(&self, call: &PluginCall<'_>) -> Result<Value, Vec<Diagnostic>> {
        let relative = call
            .argument("path")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let path = match call.base_dir() {
            Some(base) => base.join(relative),
            None => PathBuf::from(relative),
        };
        debug!(path:? = path; "Reading JSON data");

        let text = fs::read_to_string(&path).map_err(|err| {
            vec![
                call.error("Plugin invocation failed")
                    .with_detail(format!("cannot read `{}`: {err}", path.display())),
            ]
        })?;
        serde_json::from_str(&text).map_err(|err| {
            vec![
                call.error("Plugin invocation failed")
                    .with_detail(format!("`{}` is not valid JSON: {err}", path.display())),
            ]
        })
    }
}

/// `content list`: a markdown list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentList;

impl super::Plugin for ContentList {
    fn descriptors(&self) -> Vec<PluginDescriptor> {
        vec![
            PluginDescriptor::new(NAMESPACE, BlockKind::Content, "list", version())
                .with_invocation_schema(
                    Schema::new()
                        .optional("items", ValueType::List)
                        .optional("from", ValueType::String)
                        .optional("format", ValueType::String),
                ),
        ]
    }

    fn invoke(&self, call: &PluginCall<'_>) -> Result<Value, Vec<Diagnostic>> {
        let items = match (call.argument("items"), from_data(call)?) {
            (Some(items), _) | (None, Some(items)) => items,
            (None, None) => {
                return Err(vec![
                    call.error("list has no items")
                        .with_help("set `items = [...]` or `from = \"<data name>\"`"),
                ]);
            }
        };
        let Some(items) = items.as_array() else {
            return Err(vec![call.error("list items must be a list")]);
        };

        let format = call
            .argument("format")
            .and_then(Value::as_str)
            .unwrap_or("unordered");
        let lines: Vec<String> = match format {
            "unordered" => items
                .iter()
                .map(|item| format!("- {}", value_to_text(item)))
                .collect(),
            "ordered" => items
                .iter()
                .enumerate()
                .map(|(index, item)| format!("{}. {}", index + 1, value_to_text(item)))
                .collect(),
            "tasklist" => items
                .iter()
                .map(|item| format!("- [ ] {}", value_to_text(item)))
                .collect(),
            other => {
                return Err(vec![
                    call.error(format!("unknown list format `{other}`"))
                        .with_help("use `unordered`, `ordered` or `tasklist`"),
                ]);
            }
        };

        Ok(json!(lines.join("\n")))
    }
}

/// `content table`: a markdown table over a list of objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentTable;

impl super::Plugin for ContentTable {
    fn descriptors(&self) -> Vec<PluginDescriptor> {
        vec![
            PluginDescriptor::new(NAMESPACE, BlockKind::Content, "table", version())
                .with_invocation_schema(
                    Schema::new()
                        .required("from", ValueType::String)
                        .optional("columns", ValueType::List),
                ),
        ]
    }

    fn invoke(&self, call: &PluginCall<'_>) -> Result<Value, Vec<Diagnostic>> {
        let rows = from_data(call)?
            .and_then(Value::as_array)
            .ok_or_else(|| vec![call.error("table data must be a list of objects")])?;

        let columns: Vec<String> = match call.argument("columns").and_then(Value::as_array) {
            Some(columns) => columns.iter().map(value_to_text).collect(),
            None => rows
                .first()
                .and_then(Value::as_object)
                .map(|row| row.keys().cloned().collect())
                .unwrap_or_default(),
        };
        if columns.is_empty() {
            return Err(vec![
                call.error("table has no columns")
                    .with_help("set `columns = [...]` or provide rows with fields"),
            ]);
        }

        let mut lines = Vec::with_capacity(rows.len() + 2);
        lines.push(format!("| {} |", columns.join(" | ")));
        lines.push(format!("|{}", " --- |".repeat(columns.len())));
        for row in rows {
            let cells: Vec<String> = columns
                .iter()
                .map(|column| row.get(column).map(value_to_text).unwrap_or_default())
                .collect();
            lines.push(format!("| {} |", cells.join(" | ")));
        }

        Ok(json!(lines.join("\n")))
    }
}

/// `content code`: a fenced code block.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentCode;

impl super::Plugin for ContentCode {
    fn descriptors(&self) -> Vec<PluginDescriptor> {
        vec![
            PluginDescriptor::new(NAMESPACE, BlockKind::Content, "code", version())
                .with_invocation_schema(
                    Schema::new()
                        .optional("value", ValueType::String)
                        .optional("from", ValueType::String)
                        .optional("language", ValueType::String),
                ),
        ]
    }

    fn invoke(&self, call: &PluginCall<'_>) -> Result<Value, Vec<Diagnostic>> {
        let body = match (call.argument("value").and_then(Value::as_str), from_data(call)?) {
            (Some(value), _) => value.to_string(),
            (None, Some(data)) => serde_json::to_string_pretty(data)
                .map_err(|err| vec![call.error(format!("cannot serialize data: {err}"))])?,
            (None, None) => {
                return Err(vec![
                    call.error("code block has no body")
                        .with_help("set `value = \"...\"` or `from = \"<data name>\"`"),
                ]);
            }
        };
        let language = call
            .argument("language")
            .and_then(Value::as_str)
            .unwrap_or_default();

        Ok(json!(format!("```{language}\n{body}\n```")))
    }
}
