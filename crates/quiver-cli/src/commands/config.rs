//! Config command - show the resolved configuration.

use quiver_config::{ConfigLayer, ResolvedConfig, ShowFormat};

use crate::theme::Theme;

/// Print the resolved configuration in the given format.
pub(crate) fn show_config(resolved: &ResolvedConfig, format: &str) -> anyhow::Result<()> {
    let format = match format {
        "toml" => ShowFormat::Toml,
        "json" => ShowFormat::Json,
        other => anyhow::bail!("Unknown format '{other}', expected toml or json"),
    };

    let rendered = resolved.render(format)?;
    if matches!(format, ShowFormat::Toml) {
        if resolved.loaded_files.is_empty() {
            println!("{}", Theme::dimmed("# No config files found, showing defaults"));
        } else {
            for file in &resolved.loaded_files {
                println!("{}", Theme::dimmed(&format!("# Loaded: {file}")));
            }
        }
        for (field, layer) in resolved.sorted_sources() {
            if matches!(layer, ConfigLayer::Defaults) {
                continue;
            }
            println!("{}", Theme::dimmed(&format!("# {field} = {layer}")));
        }
        println!();
    }
    println!("{rendered}");

    Ok(())
}
