//! Active run tracking and run handles.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use quiver_core::{ExecutionOutcome, ExecutionResult, OutputLine, ScriptPath};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

/// Paths with a run in progress.
#[derive(Clone, Default)]
pub(crate) struct ActiveRuns {
    paths: Arc<Mutex<HashSet<ScriptPath>>>,
}

impl ActiveRuns {
    fn lock(&self) -> MutexGuard<'_, HashSet<ScriptPath>> {
        self.paths.lock().unwrap_or_else(|e| {
            warn!("ActiveRuns lock was poisoned, recovering");
            e.into_inner()
        })
    }

    /// Reserve `path`, or `None` if it is already running.
    pub(crate) fn claim(&self, path: &ScriptPath) -> Option<RunSlot> {
        if !self.lock().insert(path.clone()) {
            return None;
        }
        Some(RunSlot {
            runs: self.clone(),
            path: path.clone(),
        })
    }

    pub(crate) fn is_running(&self, path: &ScriptPath) -> bool {
        self.lock().contains(path)
    }

    pub(crate) fn count(&self) -> usize {
        self.lock().len()
    }
}

impl fmt::Debug for ActiveRuns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveRuns")
            .field("count", &self.count())
            .finish()
    }
}

/// Releases its path when dropped.
pub(crate) struct RunSlot {
    runs: ActiveRuns,
    path: ScriptPath,
}

impl Drop for RunSlot {
    fn drop(&mut self) {
        self.runs.lock().remove(&self.path);
    }
}

/// A run in progress.
///
/// Output lines arrive on [`next_line`](Self::next_line) while the script
/// runs. [`wait`](Self::wait) yields the final result. Dropping the handle
/// does not stop the run; call [`cancel`](Self::cancel) for that.
pub struct RunHandle {
    id: Uuid,
    path: ScriptPath,
    output: mpsc::UnboundedReceiver<OutputLine>,
    cancel: CancellationToken,
    task: JoinHandle<ExecutionResult>,
}

impl RunHandle {
    pub(crate) fn new(
        id: Uuid,
        path: ScriptPath,
        output: mpsc::UnboundedReceiver<OutputLine>,
        cancel: CancellationToken,
        task: JoinHandle<ExecutionResult>,
    ) -> Self {
        Self {
            id,
            path,
            output,
            cancel,
            task,
        }
    }

    /// Unique identifier of this run.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The script being run.
    #[must_use]
    pub fn path(&self) -> &ScriptPath {
        &self.path
    }

    /// Next output line, or `None` once the run has finished and all lines
    /// were delivered.
    pub async fn next_line(&mut self) -> Option<OutputLine> {
        self.output.recv().await
    }

    /// The live output channel.
    pub fn output(&mut self) -> &mut mpsc::UnboundedReceiver<OutputLine> {
        &mut self.output
    }

    /// Ask the script to stop.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this run when triggered.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the run has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to end.
    pub async fn wait(self) -> ExecutionResult {
        match self.task.await {
            Ok(result) => result,
            Err(e) => {
                warn!(run_id = %self.id, path = %self.path, error = %e, "Run task failed");
                ExecutionResult {
                    lines: Vec::new(),
                    outcome: ExecutionOutcome::failed(format!("run task failed: {e}")),
                    duration: Duration::ZERO,
                }
            },
        }
    }
}

impl fmt::Debug for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunHandle")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("finished", &self.task.is_finished())
            .finish_non_exhaustive()
    }
}
