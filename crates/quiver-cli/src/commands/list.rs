//! List command - show discovered scripts.

use crate::commands::Session;
use crate::theme::Theme;

/// Print every script, or only toolbar scripts, sorted by title.
pub(crate) async fn list_scripts(session: &Session, toolbar_only: bool) -> anyhow::Result<()> {
    let manager = &session.manager;

    if toolbar_only {
        let items = manager.toolbar_scripts().await;
        if items.is_empty() {
            println!("{}", Theme::info("No toolbar scripts."));
            return Ok(());
        }
        println!("\n{}", Theme::header("Toolbar"));
        println!("{}", Theme::separator());
        for item in items {
            println!("  {:<20} {}", item.label, Theme::dimmed(&item.path.to_string()));
        }
        println!();
        return Ok(());
    }

    let scripts = manager.list_scripts().await;
    if scripts.is_empty() {
        let dirs = manager.directories().await;
        if dirs.is_empty() {
            println!("{}", Theme::info("No script directories found."));
        } else {
            println!("{}", Theme::info("No scripts found in:"));
            for dir in dirs {
                println!("  {}", dir.display());
            }
        }
        println!(
            "{}",
            Theme::dimmed("Run `quiver init` to create an example script.")
        );
        return Ok(());
    }

    println!("\n{}", Theme::header(&format!("Scripts ({})", scripts.len())));
    println!("{}", Theme::separator());
    for entry in scripts {
        let marker = if entry.toolbar { "*" } else { " " };
        println!("{marker} {}", entry.title);
        if !entry.description.is_empty() {
            println!("    {}", entry.description);
        }
        println!("    {}", Theme::dimmed(&entry.path.to_string()));
        if let Some(error) = &entry.parse_error {
            println!("    {}", Theme::error(error));
        }
    }
    println!();

    Ok(())
}
