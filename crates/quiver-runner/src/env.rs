//! Child process environment.

use std::path::Path;

use tokio::process::Command;

/// Variable naming the script being run, for the script's own use.
pub const SCRIPT_PATH_VAR: &str = "QUIVER_SCRIPT_PATH";

/// Variables inherited from the parent when the environment is cleaned.
const ALLOWED_ENV_VARS: &[&str] = &[
    // Essential system variables
    "PATH", "HOME", "USER", "LOGNAME", "SHELL", "TERM", "LANG", "LC_ALL", "LC_CTYPE",
    // Temporary directories
    "TMPDIR", "TMP", "TEMP",
    // Interpreter selection
    "VIRTUAL_ENV", "PYTHONHOME", "PYTHONPATH",
    // Windows essentials
    "SYSTEMROOT", "USERPROFILE", "APPDATA", "LOCALAPPDATA",
];

/// Configure the environment of `cmd` for running `script`.
///
/// With `clean` set, everything but [`ALLOWED_ENV_VARS`] is dropped first.
pub(crate) fn apply(cmd: &mut Command, script: &Path, clean: bool) {
    if clean {
        cmd.env_clear();
        for var in ALLOWED_ENV_VARS {
            if let Some(value) = std::env::var_os(var) {
                cmd.env(var, value);
            }
        }
    }

    cmd.env(SCRIPT_PATH_VAR, script);
    cmd.env("PYTHONIOENCODING", "utf-8");
    cmd.env("PYTHONUNBUFFERED", "1");
}
