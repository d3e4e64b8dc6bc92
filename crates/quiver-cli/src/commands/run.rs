//! Run command - execute a script with live output.

use std::path::Path;
use std::process::ExitCode;

use quiver_core::{ExecutionOutcome, GateDecision, OutputStream};

use crate::commands::Session;
use crate::theme::Theme;

/// Run a script, prompting for acknowledgment when the gate asks for it.
///
/// Ctrl-C cancels the run. Exits with failure when the run is refused, fails
/// or is cancelled.
pub(crate) async fn run_script(session: &Session, path: &Path, yes: bool) -> anyhow::Result<ExitCode> {
    let path = session.resolve(path);
    let manager = &session.manager;

    match manager.request_execution(&path).await? {
        GateDecision::Allowed => {},
        GateDecision::RequiresAcknowledgment { reasons } => {
            println!(
                "{}",
                Theme::warning("This script uses operations that can modify your system:")
            );
            for reason in &reasons {
                println!("    {reason}");
            }
            println!();

            if !yes {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt("Run it anyway?")
                    .default(false)
                    .interact()?;

                if !confirm {
                    println!("{}", Theme::info("Aborted."));
                    return Ok(ExitCode::FAILURE);
                }
            }
            manager.acknowledge(&path);
        },
        GateDecision::Blocked { reason } => {
            eprintln!("{}", Theme::error(&format!("Refusing to run: {reason}")));
            return Ok(ExitCode::FAILURE);
        },
    }

    let mut handle = manager.run(&path).await?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut cancelled = false;

    loop {
        tokio::select! {
            biased;
            _ = &mut ctrl_c, if !cancelled => {
                cancelled = true;
                eprintln!("{}", Theme::warning("Cancelling..."));
                handle.cancel();
            }
            line = handle.next_line() => match line {
                Some(line) => match line.stream {
                    OutputStream::Stdout => println!("{}", line.text),
                    OutputStream::Stderr => eprintln!("{}", Theme::stderr_line(&line.text)),
                },
                None => break,
            }
        }
    }

    let result = handle.wait().await;
    let elapsed = format!("{:.1}s", result.duration.as_secs_f64());
    println!("{}", Theme::separator());
    match result.outcome {
        ExecutionOutcome::Completed => {
            println!("{}", Theme::success(&format!("Finished in {elapsed}")));
            Ok(ExitCode::SUCCESS)
        },
        ExecutionOutcome::Failed { message, trace } => {
            eprintln!("{}", Theme::error(&message));
            for frame in trace.unwrap_or_default() {
                eprintln!("    {}", Theme::dimmed(&frame.to_string()));
            }
            Ok(ExitCode::FAILURE)
        },
        ExecutionOutcome::Cancelled => {
            println!("{}", Theme::warning(&format!("Cancelled after {elapsed}")));
            Ok(ExitCode::FAILURE)
        },
    }
}
