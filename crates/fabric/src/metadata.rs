//! Document metadata returned next to the rendered lines.

use serde::Serialize;
use serde_json::{Map, Value};

/// What a render learned about its document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderMetadata {
    document: String,
    title: Option<String>,
    /// The document's `meta { ... }` attributes.
    meta: Map<String, Value>,
    /// Names in the data context at the end of the render, in insertion order.
    data_names: Vec<String>,
    /// Plugin evaluations requested during the render.
    plugin_calls: usize,
}

impl RenderMetadata {
    pub(crate) fn new(
        document: impl Into<String>,
        title: Option<String>,
        meta: Map<String, Value>,
        data_names: Vec<String>,
        plugin_calls: usize,
    ) -> Self {
        Self {
            document: document.into(),
            title,
            meta,
            data_names,
            plugin_calls,
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    pub fn data_names(&self) -> &[String] {
        &self.data_names
    }

    pub fn plugin_calls(&self) -> usize {
        self.plugin_calls
    }
}
