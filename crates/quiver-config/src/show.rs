use serde::Serialize;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};
use crate::types::Config;

/// The effective configuration plus where each value came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Merged, validated configuration.
    pub config: Config,
    /// Source layer per dotted field path.
    pub field_sources: FieldSources,
    /// Config files that were found and merged, lowest precedence first.
    pub loaded_files: Vec<String>,
}

/// Output format for [`ResolvedConfig::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFormat {
    /// TOML, as it would appear in a config file.
    Toml,
    /// Pretty-printed JSON.
    Json,
}

#[derive(Serialize)]
struct JsonView<'a> {
    config: &'a Config,
    loaded_files: &'a [String],
    sources: Vec<(String, String)>,
}

impl ResolvedConfig {
    /// The layer that set `field` (dotted path), if known.
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<&ConfigLayer> {
        self.field_sources.get(field)
    }

    /// Field paths with their source layer, sorted by path.
    #[must_use]
    pub fn sorted_sources(&self) -> Vec<(&str, &ConfigLayer)> {
        let mut sources: Vec<_> = self
            .field_sources
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        sources.sort_by(|a, b| a.0.cmp(b.0));
        sources
    }

    /// Render the effective configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RenderError`] if serialization fails.
    pub fn render(&self, format: ShowFormat) -> ConfigResult<String> {
        match format {
            ShowFormat::Toml => toml::to_string_pretty(&self.config)
                .map_err(|e| ConfigError::RenderError(e.to_string())),
            ShowFormat::Json => {
                let view = JsonView {
                    config: &self.config,
                    loaded_files: &self.loaded_files,
                    sources: self
                        .sorted_sources()
                        .into_iter()
                        .map(|(k, v)| (k.to_owned(), v.to_string()))
                        .collect(),
                };
                serde_json::to_string_pretty(&view)
                    .map_err(|e| ConfigError::RenderError(e.to_string()))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved() -> ResolvedConfig {
        let mut field_sources = FieldSources::new();
        field_sources.insert("runner.interpreter".into(), ConfigLayer::Environment);
        field_sources.insert("logging.level".into(), ConfigLayer::Defaults);
        ResolvedConfig {
            config: Config::default(),
            field_sources,
            loaded_files: vec!["/home/u/.quiver/config.toml".into()],
        }
    }

    #[test]
    fn test_render_toml_contains_sections() {
        let out = resolved().render(ShowFormat::Toml).unwrap();
        assert!(out.contains("[runner]"));
        assert!(out.contains("interpreter = \"python3\""));
    }

    #[test]
    fn test_render_json_includes_sources() {
        let out = resolved().render(ShowFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["config"]["watcher"]["debounce_ms"], 300);
        assert_eq!(value["sources"][0][0], "logging.level");
        assert_eq!(value["sources"][1][1], "environment variable");
    }
}
