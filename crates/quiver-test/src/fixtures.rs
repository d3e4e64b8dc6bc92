//! Canned script sources.

use quiver_core::FlagReason;

/// Declares a description and prints `a` then `b`.
pub const WORKED_EXAMPLE: &str = "\"\"\"\nDescription: test\n\"\"\"\nprint('a')\nprint('b')\n";

/// Harmless script with a full header and a main guard.
pub const CLEAN_SCRIPT: &str = r#""""
Title: Greeting
Description: Says hello
"""


def main():
    print("hello")


if __name__ == "__main__":
    main()
"#;

/// Calls `os.system` on line 6.
pub const RISKY_SCRIPT: &str = r#""""
Title: Cleanup
"""
import os

os.system("echo cleanup")
"#;

/// Same as [`RISKY_SCRIPT`] but declared reviewed by its author.
pub const VALIDATED_RISKY_SCRIPT: &str = r#""""
Title: Reviewed Cleanup
Validated: true
"""
import os

os.system("echo cleanup")
"#;

/// Mentions risky calls only inside comments and strings.
pub const DECOY_SCRIPT: &str = r#"# Never call os.system("x") here
message = "eval(1) and exec('x') are not used"
print(message)
"#;

/// Raises from `main()` on line 2.
pub const FAILING_SCRIPT: &str = "def main():\n    raise ValueError(\"bad input\")\n";

/// Prints `ready`, then sleeps for a long time.
pub const SLOW_SCRIPT: &str = "import time\nprint('ready', flush=True)\ntime.sleep(60)\n";

/// Offered on the toolbar under a custom label.
pub const TOOLBAR_SCRIPT: &str = "# Title: Export Data\n# Toolbar: yes\n# ToolbarLabel: Export\nprint('exported')\n";

/// A flag reason for assertions.
#[must_use]
pub fn flag_reason(rule: &str, line: usize, excerpt: &str) -> FlagReason {
    FlagReason {
        rule: rule.to_string(),
        line,
        excerpt: excerpt.to_string(),
    }
}
