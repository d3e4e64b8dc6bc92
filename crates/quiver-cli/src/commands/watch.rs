//! Watch command - report script changes as they happen.

use quiver_kernel::KernelError;
use quiver_registry::{RegistryEvent, WatchError};

use crate::commands::Session;
use crate::theme::Theme;

/// Watch the script directories until Ctrl-C.
pub(crate) async fn watch_scripts(session: &Session) -> anyhow::Result<()> {
    let manager = &session.manager;

    let watch = match manager.start_watching().await {
        Ok(watch) => watch,
        Err(KernelError::Watch(WatchError::NoWatchableDirectories)) => {
            println!("{}", Theme::info("No script directories exist, nothing to watch."));
            return Ok(());
        },
        Err(e) => return Err(e.into()),
    };

    println!("{}", Theme::header("Watching"));
    for dir in manager.directories().await {
        println!("  {}", dir.display());
    }
    println!("{}", Theme::dimmed("Press Ctrl-C to stop."));
    println!();

    let subscription = manager.on_registry_changed(|event| {
        let stamp = Theme::timestamp(&chrono::Utc::now());
        let line = match event {
            RegistryEvent::Added { path } => Theme::success(&format!("added {path}")),
            RegistryEvent::Updated { path } => Theme::info(&format!("updated {path}")),
            RegistryEvent::Removed { path } => Theme::warning(&format!("removed {path}")),
            RegistryEvent::Reloaded { count } => {
                Theme::info(&format!("reloaded, {count} script(s)"))
            },
        };
        println!("{stamp} {line}");
    });

    tokio::signal::ctrl_c().await?;

    subscription.unsubscribe();
    watch.stop();
    println!();
    println!("{}", Theme::info("Stopped watching."));
    Ok(())
}
