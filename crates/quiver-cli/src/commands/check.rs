//! Check command - screen scripts for dangerous operations.

use std::path::Path;
use std::process::ExitCode;

use quiver_core::ValidationVerdict;

use crate::commands::Session;
use crate::theme::Theme;

/// Screen one script, or all of them.
///
/// Exits with failure when any script is flagged or cannot be analyzed.
pub(crate) async fn check_scripts(
    session: &Session,
    path: Option<&Path>,
) -> anyhow::Result<ExitCode> {
    let manager = &session.manager;

    let targets = match path {
        Some(path) => vec![session.resolve(path)],
        None => manager
            .list_scripts()
            .await
            .into_iter()
            .map(|e| e.path.into_path_buf())
            .collect(),
    };
    if targets.is_empty() {
        println!("{}", Theme::info("No scripts to check."));
        return Ok(ExitCode::SUCCESS);
    }

    let mut problems = 0usize;
    for target in &targets {
        let verdict = manager.validate(target).await?;
        match &verdict {
            ValidationVerdict::Clean => {
                println!("{}", Theme::success(&target.display().to_string()));
            },
            ValidationVerdict::Flagged(reasons) => {
                problems = problems.saturating_add(1);
                println!("{}", Theme::warning(&target.display().to_string()));
                for reason in reasons {
                    println!("    {reason}");
                }
            },
            ValidationVerdict::ParseFailed(message) => {
                problems = problems.saturating_add(1);
                println!("{}", Theme::error(&target.display().to_string()));
                println!("    {message}");
            },
        }
    }

    println!();
    if problems == 0 {
        println!(
            "{}",
            Theme::success(&format!("{} script(s) clean", targets.len()))
        );
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{}",
            Theme::warning(&format!(
                "{problems} of {} script(s) need review",
                targets.len()
            ))
        );
        Ok(ExitCode::FAILURE)
    }
}
