//! Show command - details for one script.

use std::path::Path;

use quiver_core::ValidationVerdict;

use crate::commands::Session;
use crate::theme::Theme;

/// Print a script's metadata and screening verdict.
pub(crate) async fn show_script(session: &Session, path: &Path) -> anyhow::Result<()> {
    let path = session.resolve(path);
    let manager = &session.manager;

    let Some(entry) = manager.get_script(&path).await else {
        anyhow::bail!("No script registered at {}", path.display());
    };
    let verdict = manager.validate(&path).await?;

    println!("\n{}", Theme::header(&entry.title));
    println!("{}", Theme::separator());
    println!("  {}", Theme::kv("Path", &entry.path.to_string()));
    if !entry.description.is_empty() {
        println!("  {}", Theme::kv("Description", &entry.description));
    }
    if entry.toolbar {
        let label = entry.toolbar_label.as_deref().unwrap_or(&entry.title);
        println!("  {}", Theme::kv("Toolbar", label));
    }
    if let Some(modified) = &entry.modified {
        println!("  {}", Theme::kv("Modified", &Theme::timestamp(modified)));
    }
    println!("  {}", Theme::kv("Screening", &Theme::verdict(&verdict)));
    if entry.validated {
        println!("  {}", Theme::kv("Reviewed", "yes (Validated: true)"));
    }
    if manager.acknowledgments().is_acknowledged(&entry.path) {
        println!("  {}", Theme::kv("Acknowledged", "this session"));
    }

    match &verdict {
        ValidationVerdict::Flagged(reasons) => {
            println!();
            for reason in reasons {
                println!("  {}", Theme::warning(&reason.to_string()));
            }
        },
        ValidationVerdict::ParseFailed(message) => {
            println!();
            println!("  {}", Theme::error(message));
        },
        ValidationVerdict::Clean => {},
    }
    println!();

    Ok(())
}
