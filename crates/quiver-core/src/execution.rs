//! Execution result types produced by the runner.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which stream a line of output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// A single line of captured script output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    /// Originating stream.
    pub stream: OutputStream,
    /// Line text without the trailing newline.
    pub text: String,
}

impl OutputLine {
    /// A stdout line.
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stdout,
            text: text.into(),
        }
    }

    /// A stderr line.
    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stderr,
            text: text.into(),
        }
    }
}

/// One frame of a script traceback, innermost last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFrame {
    /// Source file of the frame.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
    /// Function name, `<module>` for top-level code.
    pub function: String,
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} in {}", self.file, self.line, self.function)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// The entry routine returned normally.
    Completed,
    /// The script raised, the interpreter failed, or the run timed out.
    Failed {
        /// Human-readable failure message.
        message: String,
        /// Traceback frames, when the failure was an uncaught exception.
        trace: Option<Vec<TraceFrame>>,
    },
    /// The run was cancelled by the caller.
    Cancelled,
}

impl ExecutionOutcome {
    /// A failure without a traceback.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            trace: None,
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Output lines in arrival order.
    pub lines: Vec<OutputLine>,
    /// Final outcome.
    pub outcome: ExecutionOutcome,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

impl ExecutionResult {
    /// Text of the stdout lines only.
    #[must_use]
    pub fn stdout_lines(&self) -> Vec<&str> {
        self.lines_of(OutputStream::Stdout)
    }

    /// Text of the stderr lines only.
    #[must_use]
    pub fn stderr_lines(&self) -> Vec<&str> {
        self.lines_of(OutputStream::Stderr)
    }

    /// Whether the outcome is [`ExecutionOutcome::Completed`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ExecutionOutcome::Completed)
    }

    fn lines_of(&self, stream: OutputStream) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| l.stream == stream)
            .map(|l| l.text.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_filters_keep_order() {
        let result = ExecutionResult {
            lines: vec![
                OutputLine::stdout("a"),
                OutputLine::stderr("warn"),
                OutputLine::stdout("b"),
            ],
            outcome: ExecutionOutcome::Completed,
            duration: Duration::from_millis(5),
        };
        assert_eq!(result.stdout_lines(), vec!["a", "b"]);
        assert_eq!(result.stderr_lines(), vec!["warn"]);
        assert!(result.is_success());
    }

    #[test]
    fn test_failed_helper() {
        let outcome = ExecutionOutcome::failed("boom");
        assert_eq!(
            outcome,
            ExecutionOutcome::Failed {
                message: "boom".into(),
                trace: None
            }
        );
    }
}
