//! Static entry point detection.

use std::fmt;
use std::sync::LazyLock;

use quiver_screen::lexer::mask_source;
use regex::Regex;

static MAIN_GUARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^if\s+(__name__\s*==\s*['"]__main__['"]|['"]__main__['"]\s*==\s*__name__)\s*:"#,
    )
    .expect("invalid regex")
});

static MAIN_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^def\s+main\s*\(").expect("invalid regex"));

/// How a script is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    /// The file has an `if __name__ == "__main__":` guard. Run it as `__main__`.
    MainGuard,
    /// The file defines a top-level `main()` but no guard. Import it under a
    /// private name, then call `main()`.
    MainFunction,
    /// Neither. Run the file top to bottom as `__main__`.
    TopLevel,
}

impl EntryPoint {
    /// Mode argument understood by the bootstrap program.
    #[must_use]
    pub fn as_arg(self) -> &'static str {
        match self {
            Self::MainGuard => "main_guard",
            Self::MainFunction => "main_function",
            Self::TopLevel => "top_level",
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// Choose the entry point of `source` without running it.
///
/// Only top-level (column 0) statements count. Lines inside string literals
/// are ignored when the source can be masked.
#[must_use]
pub fn detect_entry_point(source: &str) -> EntryPoint {
    let masked = mask_source(source).ok();
    let code_lines: Vec<&str> = match &masked {
        // Keep raw lines (the guard compares string literals) but drop those
        // whose first char was blanked, i.e. lines inside a docstring.
        Some(masked) => source
            .lines()
            .zip(masked.lines())
            .filter(|(raw, m)| raw.chars().next() == m.chars().next())
            .map(|(raw, _)| raw)
            .collect(),
        None => source.lines().collect(),
    };

    if code_lines.iter().any(|l| MAIN_GUARD.is_match(l)) {
        EntryPoint::MainGuard
    } else if code_lines.iter().any(|l| MAIN_FUNCTION.is_match(l)) {
        EntryPoint::MainFunction
    } else {
        EntryPoint::TopLevel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_wins_over_main_function() {
        let src = "def main():\n    print('a')\n\nif __name__ == \"__main__\":\n    main()\n";
        assert_eq!(detect_entry_point(src), EntryPoint::MainGuard);
    }

    #[test]
    fn test_reversed_guard() {
        let src = "if '__main__' == __name__:\n    pass\n";
        assert_eq!(detect_entry_point(src), EntryPoint::MainGuard);
    }

    #[test]
    fn test_main_function_without_guard() {
        let src = "import os\n\ndef main ():\n    print(os.getcwd())\n";
        assert_eq!(detect_entry_point(src), EntryPoint::MainFunction);
    }

    #[test]
    fn test_top_level() {
        assert_eq!(detect_entry_point("print('a')\nprint('b')\n"), EntryPoint::TopLevel);
    }

    #[test]
    fn test_nested_main_is_not_entry() {
        let src = "class Tool:\n    def main(self):\n        pass\n";
        assert_eq!(detect_entry_point(src), EntryPoint::TopLevel);
    }

    #[test]
    fn test_docstring_mentions_do_not_count() {
        let src = "\"\"\"\nUsage:\ndef main():\nif __name__ == '__main__':\n\"\"\"\nprint('x')\n";
        assert_eq!(detect_entry_point(src), EntryPoint::TopLevel);
    }
}
