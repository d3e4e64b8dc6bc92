//! The Python program that hosts a script run.
//!
//! The bootstrap is passed to the interpreter with `-c` and receives the
//! script path and an [`EntryPoint`](crate::EntryPoint) mode as arguments.
//! The script text itself arrives on stdin: the bootstrap compiles exactly
//! that text under the script's path and never reads the file. It puts the
//! script directory first on `sys.path`, runs the entry routine, and on an
//! uncaught exception writes one [`FAILURE_SENTINEL`]-prefixed JSON record to
//! stderr:
//!
//! ```text
//! <sentinel>{"message": "ValueError: bad", "trace": [{"file": "...", "line": 3, "function": "main"}]}
//! ```
//!
//! `SystemExit` is honored: zero or `None` exits cleanly, anything else exits
//! non-zero without a record. `KeyboardInterrupt` exits with status 130.

use quiver_core::TraceFrame;
use serde::Deserialize;

/// Prefix marking the failure record line on stderr.
pub const FAILURE_SENTINEL: &str = "\u{1e}QUIVER_FAILURE\u{1e}";

/// Exit status used when the script is interrupted.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Source of the bootstrap program.
pub const BOOTSTRAP_SOURCE: &str = r#"
import json
import os
import sys
import traceback
import types

SENTINEL = "\x1eQUIVER_FAILURE\x1e"


def report(exc, script):
    frames = traceback.extract_tb(exc.__traceback__)
    start = next((i for i, f in enumerate(frames) if f.filename == script), 0)
    trace = [
        {"file": f.filename, "line": f.lineno or 0, "function": f.name}
        for f in frames[start:]
    ]
    message = "".join(traceback.format_exception_only(type(exc), exc)).strip()
    sys.stdout.flush()
    sys.stderr.flush()
    sys.stderr.write(SENTINEL + json.dumps({"message": message, "trace": trace}) + "\n")
    sys.stderr.flush()


def load_source():
    source = sys.stdin.buffer.read().decode("utf-8")
    sys.stdin = open(os.devnull)
    return source[1:] if source.startswith("\ufeff") else source


def execute(source, script, name):
    module = types.ModuleType(name)
    module.__file__ = script
    sys.modules[name] = module
    exec(compile(source, script, "exec"), module.__dict__)
    return module


def run(script, mode):
    source = load_source()
    sys.path.insert(0, os.path.dirname(script))
    sys.argv = [script]
    try:
        if mode == "main_function":
            execute(source, script, "__quiver_script__").main()
        else:
            execute(source, script, "__main__")
    except SystemExit as exc:
        if exc.code is None or exc.code == 0:
            return 0
        if isinstance(exc.code, int):
            return exc.code
        print(exc.code, file=sys.stderr)
        return 1
    except KeyboardInterrupt:
        return 130
    except BaseException as exc:
        report(exc, script)
        return 1
    return 0


sys.exit(run(os.path.abspath(sys.argv[1]), sys.argv[2]))
"#;

/// A failure record emitted by the bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FailureRecord {
    /// `ExceptionType: message`.
    pub message: String,
    /// Frames from the script's first frame inward.
    pub trace: Vec<TraceFrame>,
}

impl FailureRecord {
    /// Parse a stderr line, returning `None` unless it is a failure record.
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        let payload = line.strip_prefix(FAILURE_SENTINEL)?;
        match serde_json::from_str(payload) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(error = %e, "Malformed failure record, keeping as output");
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_line() {
        let line = format!(
            "{FAILURE_SENTINEL}{{\"message\": \"ValueError: bad\", \"trace\": \
             [{{\"file\": \"/s/a.py\", \"line\": 3, \"function\": \"main\"}}]}}"
        );
        let record = FailureRecord::parse_line(&line).unwrap();
        assert_eq!(record.message, "ValueError: bad");
        assert_eq!(record.trace[0].line, 3);
        assert_eq!(record.trace[0].function, "main");
    }

    #[test]
    fn test_ordinary_lines_are_not_records() {
        assert!(FailureRecord::parse_line("Traceback (most recent call last):").is_none());
        assert!(FailureRecord::parse_line(&format!("{FAILURE_SENTINEL}not json")).is_none());
    }

    #[test]
    fn test_bootstrap_sentinel_matches() {
        assert!(BOOTSTRAP_SOURCE.contains(r#"SENTINEL = "\x1eQUIVER_FAILURE\x1e""#));
        assert!(BOOTSTRAP_SOURCE.contains(&format!("return {INTERRUPTED_EXIT_CODE}")));
    }

    #[test]
    fn test_bootstrap_never_reads_the_script_file() {
        assert!(BOOTSTRAP_SOURCE.contains("sys.stdin.buffer.read()"));
        assert!(!BOOTSTRAP_SOURCE.contains("run_path"));
    }
}
