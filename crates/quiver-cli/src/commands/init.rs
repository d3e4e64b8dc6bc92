//! Init command - write the example script.

use std::path::Path;

use quiver_kernel::EXAMPLE_FILE_NAME;

use crate::commands::Session;
use crate::theme::Theme;

/// Write the example script into `dir`, or the first script directory.
pub(crate) async fn init_example(session: &Session, dir: Option<&Path>) -> anyhow::Result<()> {
    let manager = &session.manager;

    let target = match dir {
        Some(dir) => session.resolve(dir),
        None => manager
            .config()
            .directories
            .first()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No script directory configured; pass one explicitly"))?,
    };

    match manager.ensure_example_script(&target).await? {
        Some(written) => {
            println!(
                "{}",
                Theme::success(&format!("Created {}", written.display()))
            );
            println!("  Run it with: quiver run {}", written.display());
        },
        None => {
            println!(
                "{}",
                Theme::info(&format!(
                    "{} already has scripts, {EXAMPLE_FILE_NAME} not written",
                    target.display()
                ))
            );
        },
    }
    println!();

    Ok(())
}
