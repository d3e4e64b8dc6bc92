//! First-run example script.

use std::path::{Path, PathBuf};

use quiver_registry::{DiscoveryOptions, RegistryError, RegistryResult, find_scripts};
use tracing::info;

/// File name of the example script.
pub const EXAMPLE_FILE_NAME: &str = "layers_example.py";

/// Source of the example script.
pub const EXAMPLE_SCRIPT: &str = r#""""
Title: Layers Example
Description: Example script demonstrating print usage and a summary of the working directory
Toolbar: true
ToolbarLabel: Example
"""

import os


def main():
    """Main script function"""
    print("Starting example script...")

    here = os.getcwd()
    entries = sorted(os.listdir(here))
    print(f"Analyzing folder: {os.path.basename(here)}")
    print(f"Number of entries found: {len(entries)}")

    if not entries:
        print("No entries in this folder.")
    else:
        print("Entry list:")
        for i, name in enumerate(entries, 1):
            kind = "Folder" if os.path.isdir(os.path.join(here, name)) else "File"
            print(f"  {i}. {name} ({kind})")

    print("Script executed successfully!")


if __name__ == "__main__":
    main()
"#;

/// Write the example script into `dir` if it holds no scripts yet.
///
/// Creates `dir` when missing. Returns the path written, or `None` when the
/// directory already has scripts.
pub(crate) fn write_example(dir: &Path, options: &DiscoveryOptions) -> RegistryResult<Option<PathBuf>> {
    if dir.is_dir() && !find_scripts(dir, options)?.is_empty() {
        return Ok(None);
    }

    std::fs::create_dir_all(dir).map_err(|source| RegistryError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(EXAMPLE_FILE_NAME);
    std::fs::write(&path, EXAMPLE_SCRIPT).map_err(|source| RegistryError::Io {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), "Created example script");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use quiver_core::parse_metadata;
    use quiver_registry::ScriptRegistry;
    use quiver_test::{CLEAN_SCRIPT, ScriptDir};

    use super::*;

    #[test]
    fn test_example_metadata() {
        let meta = parse_metadata(Path::new(EXAMPLE_FILE_NAME), EXAMPLE_SCRIPT);
        assert_eq!(meta.title, "Layers Example");
        assert!(meta.toolbar);
        assert_eq!(meta.toolbar_label.as_deref(), Some("Example"));
    }

    #[test]
    fn test_example_is_clean() {
        let dir = ScriptDir::new().with_script(EXAMPLE_FILE_NAME, EXAMPLE_SCRIPT);
        let mut registry = ScriptRegistry::default();
        registry.discover(&[dir.path_buf()]);
        let verdict = registry
            .validate(&dir.script_path(EXAMPLE_FILE_NAME))
            .unwrap();
        assert!(verdict.is_clean());
    }

    #[test]
    fn test_writes_into_missing_directory() {
        let root = ScriptDir::new();
        let dir = root.path().join("scripts");
        let written = write_example(&dir, &DiscoveryOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(written, dir.join(EXAMPLE_FILE_NAME));
        assert!(written.is_file());
    }

    #[test]
    fn test_skips_directory_with_scripts() {
        let dir = ScriptDir::new().with_script("mine.py", CLEAN_SCRIPT);
        assert!(
            write_example(dir.path(), &DiscoveryOptions::default())
                .unwrap()
                .is_none()
        );
        assert!(!dir.path().join(EXAMPLE_FILE_NAME).exists());
    }
}
