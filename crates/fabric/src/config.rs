//! Configuration types for Fabric rendering.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file by the command line tool or built in code.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining render and plugin settings.
//! - [`RenderConfig`] - Heading marker and the optional render deadline.
//! - [`PluginConfig`] - Where file-reading builtin plugins resolve relative paths.
//!
//! # Example
//!
//! ```
//! # use fabric::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.render().heading_marker(), "#");
//! assert!(config.render().timeout().is_none());
//! ```

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Render configuration section.
    #[serde(default)]
    render: RenderConfig,

    /// Plugin configuration section.
    #[serde(default)]
    plugins: PluginConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(render: RenderConfig, plugins: PluginConfig) -> Self {
        Self { render, plugins }
    }

    /// Returns the render configuration.
    pub fn render(&self) -> &RenderConfig {
        &self.render
    }

    /// Returns the plugin configuration.
    pub fn plugins(&self) -> &PluginConfig {
        &self.plugins
    }

    /// Returns a mutable reference to the render configuration.
    pub fn render_mut(&mut self) -> &mut RenderConfig {
        &mut self.render
    }

    /// Returns a mutable reference to the plugin configuration.
    pub fn plugins_mut(&mut self) -> &mut PluginConfig {
        &mut self.plugins
    }
}

/// Settings for the document assembler.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Marker placed before every title heading.
    #[serde(default = "default_heading_marker")]
    heading_marker: String,

    /// Optional deadline for one render, in milliseconds.
    #[serde(default)]
    timeout_ms: Option<u64>,
}

fn default_heading_marker() -> String {
    "#".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            heading_marker: default_heading_marker(),
            timeout_ms: None,
        }
    }
}

impl RenderConfig {
    pub fn new(heading_marker: impl Into<String>, timeout_ms: Option<u64>) -> Self {
        Self {
            heading_marker: heading_marker.into(),
            timeout_ms,
        }
    }

    /// Returns the heading marker, `#` unless configured.
    pub fn heading_marker(&self) -> &str {
        &self.heading_marker
    }

    /// Returns the render deadline, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn set_timeout_ms(&mut self, timeout_ms: Option<u64>) {
        self.timeout_ms = timeout_ms;
    }
}

/// Settings for builtin plugins.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    /// Base directory for relative paths read by plugins.
    #[serde(default)]
    base_dir: Option<PathBuf>,
}

impl PluginConfig {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }

    /// Returns the configured base directory, if any.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn set_base_dir(&mut self, base_dir: Option<PathBuf>) {
        self.base_dir = base_dir;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.render().heading_marker(), "#");
        assert_eq!(config.render().timeout(), None);
        assert_eq!(config.plugins().base_dir(), None);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "render": { "timeout_ms": 250 },
        }))
        .unwrap();

        assert_eq!(config.render().heading_marker(), "#");
        assert_eq!(config.render().timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result: Result<AppConfig, _> = serde_json::from_value(serde_json::json!({
            "render": { "heading": "##" },
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_setters_override() {
        let mut config = AppConfig::default();
        config.render_mut().set_timeout_ms(Some(10));
        config.plugins_mut().set_base_dir(Some(PathBuf::from("data")));

        assert_eq!(config.render().timeout(), Some(Duration::from_millis(10)));
        assert_eq!(config.plugins().base_dir(), Some(Path::new("data")));
    }
}
