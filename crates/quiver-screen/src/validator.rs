//! Source screening.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use quiver_core::{FlagReason, ValidationVerdict};
use tracing::debug;

use crate::lexer::mask_source;
use crate::rules::RuleSet;

/// Longest excerpt kept per finding, in chars.
const MAX_EXCERPT_CHARS: usize = 160;

static DEFAULT_VALIDATOR: LazyLock<Validator> = LazyLock::new(Validator::default);

/// Screen `bytes` with the built-in rules.
///
/// Pure and deterministic: the same bytes always produce the same verdict.
#[must_use]
pub fn validate_source(bytes: &[u8]) -> ValidationVerdict {
    DEFAULT_VALIDATOR.validate(bytes)
}

/// Applies a [`RuleSet`] to script source.
#[derive(Debug, Clone)]
pub struct Validator {
    rules: RuleSet,
}

impl Validator {
    /// Create a validator over `rules`.
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// The rules this validator applies.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Screen raw source bytes.
    #[must_use]
    pub fn validate(&self, bytes: &[u8]) -> ValidationVerdict {
        match std::str::from_utf8(bytes) {
            Ok(source) => self.validate_str(source),
            Err(e) => ValidationVerdict::ParseFailed(format!("source is not valid UTF-8: {e}")),
        }
    }

    /// Screen already-decoded source.
    #[must_use]
    pub fn validate_str(&self, source: &str) -> ValidationVerdict {
        let masked = match mask_source(source) {
            Ok(masked) => masked,
            Err(e) => return ValidationVerdict::ParseFailed(e.to_string()),
        };

        // Rules see the whole masked text so a call split over a line break still matches.
        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(masked.match_indices('\n').map(|(i, _)| i.saturating_add(1)))
            .collect();
        let line_starts = line_starts.as_slice();
        let hits: BTreeSet<(usize, usize)> = self
            .rules
            .iter()
            .enumerate()
            .flat_map(|(index, rule)| {
                rule.find_offsets(&masked)
                    .map(move |offset| (line_starts.partition_point(|&s| s <= offset), index))
            })
            .collect();

        let originals: Vec<&str> = source.lines().collect();
        let rules: Vec<_> = self.rules.iter().collect();
        let reasons: Vec<FlagReason> = hits
            .into_iter()
            .filter_map(|(line, index)| {
                let original = line.checked_sub(1).and_then(|i| originals.get(i))?;
                Some(FlagReason {
                    rule: rules.get(index)?.name().to_string(),
                    line,
                    excerpt: excerpt(original),
                })
            })
            .collect();

        if reasons.is_empty() {
            ValidationVerdict::Clean
        } else {
            debug!(findings = reasons.len(), "Source flagged");
            ValidationVerdict::Flagged(reasons)
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(RuleSet::builtin())
    }
}

fn excerpt(line: &str) -> String {
    let trimmed = line.trim();
    match trimmed.char_indices().nth(MAX_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_source_is_clean_every_time() {
        let src = b"import math\n\ndef main():\n    print(math.pi)\n";
        assert_eq!(validate_source(src), ValidationVerdict::Clean);
        assert_eq!(validate_source(src), validate_source(src));
    }

    #[test]
    fn test_os_system_flagged_with_line() {
        let verdict = validate_source(b"import os\n\nos.system('ls')\n");
        let reasons = verdict.reasons();
        assert_eq!(reasons.len(), 1);
        assert_eq!(reasons[0].rule, "os.system");
        assert_eq!(reasons[0].line, 3);
        assert_eq!(reasons[0].excerpt, "os.system('ls')");
    }

    #[test]
    fn test_comments_and_strings_do_not_flag() {
        let src = b"# os.system('ls')\nmsg = \"call eval(x) later\"\n\"\"\"\nexec(1)\n\"\"\"\n";
        assert_eq!(validate_source(src), ValidationVerdict::Clean);
    }

    #[test]
    fn test_findings_in_file_then_rule_order() {
        let src = b"exec(a); eval(b)\nimport subprocess\nsubprocess.run(['x'])\n";
        let verdict = validate_source(src);
        let got: Vec<(usize, &str)> = verdict
            .reasons()
            .iter()
            .map(|r| (r.line, r.rule.as_str()))
            .collect();
        assert_eq!(got, vec![(1, "eval"), (1, "exec"), (3, "subprocess.run")]);
    }

    #[test]
    fn test_call_split_across_lines_is_flagged() {
        let verdict = validate_source(b"import os\nrc = (os\n      .system('rm -rf build'))\n");
        let reasons = verdict.reasons();
        assert_eq!(reasons.len(), 1);
        assert_eq!(reasons[0].rule, "os.system");
        assert_eq!(reasons[0].line, 2);
        assert_eq!(reasons[0].excerpt, "rc = (os");

        let verdict = validate_source(b"x = (eval\n (s))\n");
        let got: Vec<(usize, &str)> = verdict
            .reasons()
            .iter()
            .map(|r| (r.line, r.rule.as_str()))
            .collect();
        assert_eq!(got, vec![(1, "eval")]);
    }

    #[test]
    fn test_repeated_call_on_one_line_reported_once() {
        let verdict = validate_source(b"eval(a) or eval(b)\n");
        assert_eq!(verdict.reasons().len(), 1);
    }

    #[test]
    fn test_invalid_utf8_is_parse_failed() {
        let verdict = validate_source(&[0x70, 0xff, 0x0a]);
        assert!(matches!(verdict, ValidationVerdict::ParseFailed(ref m) if m.starts_with("source is not valid UTF-8")));
    }

    #[test]
    fn test_unterminated_docstring_is_parse_failed() {
        let verdict = validate_source(b"\"\"\"\nDescription: oops\n");
        assert_eq!(
            verdict,
            ValidationVerdict::ParseFailed("unterminated string literal starting at line 1".into())
        );
    }

    #[test]
    fn test_custom_rules() {
        let rules = RuleSet::empty()
            .with_rule("open", r"\bopen\s*\(", "opens files")
            .unwrap();
        let validator = Validator::new(rules);
        assert!(validator.validate(b"os.system('x')\n").is_clean());
        assert_eq!(validator.validate(b"open('f')\n").reasons()[0].rule, "open");
    }

    #[test]
    fn test_long_excerpt_truncated() {
        let line = format!("eval({})", "x".repeat(400));
        let verdict = validate_source(line.as_bytes());
        let excerpt = &verdict.reasons()[0].excerpt;
        assert!(excerpt.ends_with("..."));
        assert_eq!(excerpt.chars().count(), MAX_EXCERPT_CHARS + 3);
    }
}
