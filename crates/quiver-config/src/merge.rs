//! Layered TOML merging.
//!
//! Tables merge per field; scalars and arrays from a higher layer replace the
//! lower value. Every leaf written is recorded in [`FieldSources`] so
//! `quiver config show` can say where a value came from.

use std::collections::HashMap;
use std::fmt;

/// Which configuration layer a value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Compiled-in defaults (`defaults.toml`).
    Defaults,
    /// User-level configuration (`~/.quiver/config.toml`).
    User,
    /// Workspace-level configuration (`{workspace}/.quiver/config.toml`).
    Workspace,
    /// A `QUIVER_*` environment variable.
    Environment,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::User => write!(f, "user (~/.quiver/config.toml)"),
            Self::Workspace => write!(f, "workspace (.quiver/config.toml)"),
            Self::Environment => write!(f, "environment variable"),
        }
    }
}

/// Tracks which layer set each dotted field path.
pub type FieldSources = HashMap<String, ConfigLayer>;

/// Deep-merge `overlay` into `base`, recording the layer of every leaf it sets.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join_path(prefix, key);
                if let Some(base_val) = base_table.get_mut(key) {
                    if overlay_val.is_table() {
                        deep_merge_tracking(base_val, overlay_val, &path, layer, sources);
                    } else {
                        *base_val = overlay_val.clone();
                        sources.insert(path, layer.clone());
                    }
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    record_leaves(overlay_val, &path, layer, sources);
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            sources.insert(prefix.to_owned(), layer.clone());
        },
    }
}

/// Record every leaf under `val` as coming from `layer`.
pub fn record_leaves(
    val: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join_path(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer.clone());
    }
}

/// Set a single dotted field (e.g. `runner.interpreter`), creating tables
/// along the way.
pub fn set_field(
    root: &mut toml::Value,
    dotted: &str,
    value: toml::Value,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    let overlay = dotted
        .rsplit('.')
        .fold(value, |inner, key| {
            let mut table = toml::Table::new();
            table.insert(key.to_owned(), inner);
            toml::Value::Table(table)
        });
    deep_merge_tracking(root, &overlay, "", layer, sources);
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_overlay_replaces_scalars_and_arrays() {
        let mut base = parse("[registry]\nextensions = [\"py\"]\nrecursive = false\n");
        let overlay = parse("[registry]\nextensions = [\"pyw\"]\n");
        let mut sources = FieldSources::new();

        deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::User, &mut sources);

        assert_eq!(base["registry"]["extensions"][0].as_str(), Some("pyw"));
        assert_eq!(base["registry"]["recursive"].as_bool(), Some(false));
        assert_eq!(sources.get("registry.extensions"), Some(&ConfigLayer::User));
        assert!(!sources.contains_key("registry.recursive"));
    }

    #[test]
    fn test_new_tables_record_all_leaves() {
        let mut base = parse("[watcher]\nenabled = true\n");
        let overlay = parse("[runner]\ninterpreter = \"python3.12\"\ntimeout_secs = 9\n");
        let mut sources = FieldSources::new();

        deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::Workspace, &mut sources);

        assert_eq!(
            sources.get("runner.interpreter"),
            Some(&ConfigLayer::Workspace)
        );
        assert_eq!(
            sources.get("runner.timeout_secs"),
            Some(&ConfigLayer::Workspace)
        );
    }

    #[test]
    fn test_set_field() {
        let mut base = parse("[runner]\ninterpreter = \"python3\"\n");
        let mut sources = FieldSources::new();

        set_field(
            &mut base,
            "runner.interpreter",
            toml::Value::String("pypy3".into()),
            &ConfigLayer::Environment,
            &mut sources,
        );

        assert_eq!(base["runner"]["interpreter"].as_str(), Some("pypy3"));
        assert_eq!(
            sources.get("runner.interpreter"),
            Some(&ConfigLayer::Environment)
        );
    }
}
