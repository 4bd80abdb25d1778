//! Application configuration.

use std::path::Path;

use anyhow::{Context, Result};
use keywork_observability::{KeyworkLogger, LogFormat, LogLevel};
use keywork_ssr::{DefaultStreamRenderer, FlushPolicy, RenderOptions, DEFAULT_MAX_BUFFER};
use serde::Deserialize;

/// Keywork configuration file (`keywork.toml` or `keywork.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct KeyworkConfig {
    /// Name used as the application logger's scope.
    #[serde(default = "default_display_name")]
    pub display_name: String,

    /// Minimum log level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,

    /// Server-side rendering configuration.
    #[serde(default)]
    pub react: ReactConfig,
}

fn default_display_name() -> String {
    "Keywork Router".to_string()
}

impl Default for KeyworkConfig {
    fn default() -> Self {
        Self {
            display_name: default_display_name(),
            log_level: LogLevel::default(),
            log_format: LogFormat::default(),
            react: ReactConfig::default(),
        }
    }
}

impl KeyworkConfig {
    /// Load config from a file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Parse TOML config.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse JSON config.
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Logger configured from this file.
    pub fn logger(&self) -> KeyworkLogger {
        KeyworkLogger::new(&self.display_name)
            .with_min_level(self.log_level)
            .with_format(self.log_format)
    }

    /// Stream renderer configured from this file.
    pub fn stream_renderer(&self) -> DefaultStreamRenderer {
        DefaultStreamRenderer::new(self.react.flush).with_max_buffer(self.react.buffer_size)
    }

    /// Render options configured from this file.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::new()
            .with_stream_renderer(self.stream_renderer())
            .with_log_level(self.log_level)
            .with_logger(self.logger())
    }
}

/// Server-side rendering configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReactConfig {
    /// When buffered markup is flushed.
    #[serde(default)]
    pub flush: FlushPolicy,

    /// Bytes buffered before a flush (0 = flush at every boundary).
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_buffer_size() -> usize {
    DEFAULT_MAX_BUFFER
}

impl Default for ReactConfig {
    fn default() -> Self {
        Self {
            flush: FlushPolicy::default(),
            buffer_size: default_buffer_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = KeyworkConfig::from_toml_str("").unwrap();

        assert_eq!(config.display_name, "Keywork Router");
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.react.flush, FlushPolicy::AfterShell);
        assert_eq!(config.react.buffer_size, DEFAULT_MAX_BUFFER);
    }

    #[test]
    fn test_config_from_toml() {
        let config = KeyworkConfig::from_toml_str(
            r#"
display_name = "Storefront"
log_level = "debug"
log_format = "human"

[react]
flush = "after-each-component"
buffer_size = 0
"#,
        )
        .unwrap();

        assert_eq!(config.display_name, "Storefront");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.react.flush, FlushPolicy::AfterEachComponent);
        assert_eq!(config.react.buffer_size, 0);

        let renderer = config.stream_renderer();
        assert_eq!(renderer.flush_policy(), FlushPolicy::AfterEachComponent);
    }

    #[test]
    fn test_config_from_json() {
        let config =
            KeyworkConfig::from_json_str(r#"{ "log_level": "error", "react": { "flush": "manual" } }"#)
                .unwrap();

        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.react.flush, FlushPolicy::Manual);
    }

    #[test]
    fn test_config_rejects_unknown_flush_policy() {
        let err = KeyworkConfig::from_toml_str("[react]\nflush = \"sometimes\"").unwrap_err();
        assert!(err.to_string().contains("sometimes"));
    }

    #[test]
    fn test_config_load_reports_path() {
        let err = KeyworkConfig::load("/nonexistent/keywork.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/keywork.toml"));
    }

    #[test]
    fn test_config_load_file() {
        let path = std::env::temp_dir().join(format!("keywork-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "display_name": "Docs" }"#).unwrap();

        let config = KeyworkConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.display_name, "Docs");
    }

    #[test]
    fn test_config_render_options() {
        let config = KeyworkConfig::from_toml_str("log_level = \"warn\"").unwrap();
        let options = config.render_options();

        assert_eq!(options.log_level(), LogLevel::Warn);
        assert_eq!(options.logger().scope(), "Keywork Router");
        assert_eq!(options.logger().min_level(), LogLevel::Warn);
    }
}
