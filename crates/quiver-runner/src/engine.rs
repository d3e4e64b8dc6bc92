//! Monitored script execution.
//!
//! # Security
//!
//! The engine performs no screening of its own. Callers are expected to
//! have passed the run gate first. Isolation is limited to:
//! - a fresh interpreter process per run
//! - an optional allowlisted environment (`clean_env`)
//! - the script directory as working directory

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use quiver_core::{ExecutionOutcome, ExecutionResult, OutputLine, OutputStream, ScriptEntry};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bootstrap::{BOOTSTRAP_SOURCE, FailureRecord};
use crate::entry::{EntryPoint, detect_entry_point};
use crate::env;
use crate::error::{RunnerError, RunnerResult};

/// Receives output lines as they are produced.
pub type OutputSink = mpsc::UnboundedSender<OutputLine>;

/// How long to keep reading pipes after the interpreter is gone.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interpreter binary name or path.
    pub interpreter: String,
    /// Maximum run time, `None` for unlimited.
    pub timeout: Option<Duration>,
    /// Time between the interrupt and the kill when cancelling.
    pub cancel_grace: Duration,
    /// Start scripts with only an allowlisted environment.
    pub clean_env: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            timeout: None,
            cancel_grace: Duration::from_secs(2),
            clean_env: false,
        }
    }
}

impl EngineConfig {
    /// Use a different interpreter.
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Limit run time.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the cancellation grace period.
    #[must_use]
    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }

    /// Clean the child environment.
    #[must_use]
    pub fn with_clean_env(mut self, clean: bool) -> Self {
        self.clean_env = clean;
        self
    }
}

/// Runs scripts in a child interpreter and collects their output.
#[derive(Debug, Clone, Default)]
pub struct ExecutionEngine {
    config: EngineConfig,
}

/// What a pipe reader hands back.
enum Captured {
    Line(OutputLine),
    Failure(FailureRecord),
}

/// Why the wait loop ended.
enum Stop {
    Exited(std::io::Result<ExitStatus>),
    Cancelled,
    TimedOut,
}

/// Per-run output buffer that also forwards to the caller's sink.
struct Capture {
    sink: OutputSink,
    lines: Vec<OutputLine>,
    failure: Option<FailureRecord>,
}

impl Capture {
    fn accept(&mut self, captured: Captured) {
        match captured {
            Captured::Line(line) => {
                // A dropped receiver only means nobody is watching live.
                let _ = self.sink.send(line.clone());
                self.lines.push(line);
            },
            Captured::Failure(record) => self.failure = Some(record),
        }
    }
}

impl ExecutionEngine {
    /// Create an engine.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine settings.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether the configured interpreter can be found.
    #[must_use]
    pub fn interpreter_available(&self) -> bool {
        which::which(&self.config.interpreter).is_ok()
    }

    /// Run `entry` to completion, cancellation, or timeout.
    ///
    /// The interpreter executes `entry.source`, the same text the validator
    /// screened. The file on disk is not read again.
    ///
    /// Output lines are pushed to `sink` as they arrive and collected into
    /// the result. Never fails: every problem becomes a
    /// [`ExecutionOutcome::Failed`].
    pub async fn run(
        &self,
        entry: &ScriptEntry,
        sink: &OutputSink,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let started = Instant::now();
        let entry_point = detect_entry_point(&entry.source);
        info!(path = %entry.path, entry_point = %entry_point, "Starting script");

        let mut capture = Capture {
            sink: sink.clone(),
            lines: Vec::new(),
            failure: None,
        };
        let outcome = self
            .execute(entry, entry_point, &mut capture, cancel)
            .await
            .unwrap_or_else(|e| ExecutionOutcome::failed(e.to_string()));
        let duration = started.elapsed();

        match &outcome {
            ExecutionOutcome::Completed => info!(
                path = %entry.path,
                duration_ms = duration.as_millis(),
                lines = capture.lines.len(),
                "Script completed"
            ),
            ExecutionOutcome::Failed { message, .. } => warn!(
                path = %entry.path,
                duration_ms = duration.as_millis(),
                error = %message,
                "Script failed"
            ),
            ExecutionOutcome::Cancelled => info!(
                path = %entry.path,
                duration_ms = duration.as_millis(),
                "Script cancelled"
            ),
        }

        ExecutionResult {
            lines: capture.lines,
            outcome,
            duration,
        }
    }

    async fn execute(
        &self,
        entry: &ScriptEntry,
        entry_point: EntryPoint,
        capture: &mut Capture,
        cancel: &CancellationToken,
    ) -> RunnerResult<ExecutionOutcome> {
        let mut child = self
            .command(entry, entry_point)
            .spawn()
            .map_err(RunnerError::Spawn)?;

        // The interpreter runs the screened text, not whatever is on disk now.
        if let Some(mut stdin) = child.stdin.take() {
            let source = entry.source.clone().into_bytes();
            let path = entry.path.clone();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&source).await {
                    debug!(path = %path, error = %e, "Failed to hand script source to interpreter");
                }
            });
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump(stdout, OutputStream::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump(stderr, OutputStream::Stderr, tx.clone()));
        }
        drop(tx);

        #[allow(clippy::arithmetic_side_effects)]
        // Instant + Duration cannot overflow for configured timeouts
        let deadline = self
            .config
            .timeout
            .map(|t| tokio::time::Instant::now() + t);

        let stop = loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => break Stop::Cancelled,
                () = sleep_until(deadline) => break Stop::TimedOut,
                Some(captured) = rx.recv() => capture.accept(captured),
                status = child.wait() => break Stop::Exited(status),
            }
        };

        match stop {
            Stop::Cancelled => self.interrupt_and_reap(&mut child).await,
            Stop::TimedOut => kill_and_reap(&mut child).await,
            Stop::Exited(_) => {},
        }

        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while let Some(captured) = rx.recv().await {
                capture.accept(captured);
            }
        })
        .await;
        if drained.is_err() {
            debug!(path = %entry.path, "Output pipes still open after exit, giving up");
        }

        match stop {
            Stop::Cancelled => Ok(ExecutionOutcome::Cancelled),
            Stop::TimedOut => Err(RunnerError::TimedOut(format_duration(
                self.config.timeout.unwrap_or_default(),
            ))),
            Stop::Exited(Err(e)) => Err(RunnerError::Wait(e)),
            Stop::Exited(Ok(status)) => Ok(match capture.failure.take() {
                Some(record) => ExecutionOutcome::Failed {
                    message: record.message,
                    trace: Some(record.trace),
                },
                None if status.success() => ExecutionOutcome::Completed,
                None => ExecutionOutcome::failed(match status.code() {
                    Some(code) => format!("interpreter exited with code {code}"),
                    None => "interpreter was terminated by a signal".to_string(),
                }),
            }),
        }
    }

    fn command(&self, entry: &ScriptEntry, entry_point: EntryPoint) -> Command {
        let script = entry.path.as_path();
        let mut cmd = Command::new(&self.config.interpreter);
        cmd.arg("-u")
            .arg("-c")
            .arg(BOOTSTRAP_SOURCE)
            .arg(script)
            .arg(entry_point.as_arg())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = entry.path.parent() {
            cmd.current_dir(dir);
        }
        env::apply(&mut cmd, script, self.config.clean_env);
        cmd
    }

    /// Ask the script to stop, then kill it once the grace period is over.
    async fn interrupt_and_reap(&self, child: &mut Child) {
        send_interrupt(child);
        if tokio::time::timeout(self.config.cancel_grace, child.wait())
            .await
            .is_err()
        {
            warn!("Script ignored interrupt, killing");
            kill_and_reap(child).await;
        }
    }
}

async fn kill_and_reap(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "Kill failed, process likely already exited");
    }
    let _ = child.wait().await;
}

#[cfg(unix)]
fn send_interrupt(child: &mut Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return;
    };
    if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGINT) {
        debug!(pid, error = %e, "SIGINT failed, killing instead");
        let _ = child.start_kill();
    }
}

#[cfg(not(unix))]
fn send_interrupt(child: &mut Child) {
    let _ = child.start_kill();
}

async fn sleep_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

/// Read `reader` line by line into `tx` until EOF.
async fn pump<R>(reader: R, stream: OutputStream, tx: mpsc::UnboundedSender<Captured>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let text = text.trim_end_matches(['\n', '\r']);
                let captured = match stream {
                    OutputStream::Stdout => Captured::Line(OutputLine::stdout(text)),
                    OutputStream::Stderr => FailureRecord::parse_line(text)
                        .map_or_else(|| Captured::Line(OutputLine::stderr(text)), Captured::Failure),
                };
                if tx.send(captured).is_err() {
                    break;
                }
            },
            Err(e) => {
                debug!(error = %e, ?stream, "Output stream read failed");
                break;
            },
        }
    }
}

fn format_duration(d: Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
