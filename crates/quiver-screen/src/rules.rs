//! The dangerous-operation rule table.
//!
//! Rules are plain data: a name, a regex applied to the masked source,
//! and a human description. [`RULES`] is the built-in table. A [`RuleSet`]
//! is its compiled form and can be extended with
//! [`RuleSet::with_rule`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ScreenError, ScreenResult};

/// A screening rule before compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Short name reported in findings.
    pub name: &'static str,
    /// Regex matched against masked source. `\s` may cross line breaks.
    pub pattern: &'static str,
    /// What the matched operation can do.
    pub description: &'static str,
}

/// Build a [`Rule`] from literals.
macro_rules! screen_rule {
    ($name:literal, $re:literal, $description:literal) => {
        Rule {
            name: $name,
            pattern: $re,
            description: $description,
        }
    };
}

/// Built-in rules, in reporting order.
pub const RULES: &[Rule] = &[
    screen_rule!(
        "subprocess.call",
        r"\bsubprocess\s*\.\s*call\b",
        "spawns an external process"
    ),
    screen_rule!(
        "subprocess.run",
        r"\bsubprocess\s*\.\s*run\b",
        "spawns an external process"
    ),
    screen_rule!(
        "subprocess.Popen",
        r"\bsubprocess\s*\.\s*Popen\b",
        "spawns an external process"
    ),
    screen_rule!(
        "os.system",
        r"\bos\s*\.\s*system\s*\(",
        "runs a shell command"
    ),
    screen_rule!("eval", r"\beval\s*\(", "evaluates arbitrary code"),
    screen_rule!("exec", r"\bexec\s*\(", "executes arbitrary code"),
    screen_rule!(
        "__import__",
        r"\b__import__\s*\(",
        "imports a module by computed name"
    ),
];

/// A rule with its pattern compiled.
#[derive(Clone)]
pub struct CompiledRule {
    name: String,
    description: String,
    regex: Regex,
}

impl CompiledRule {
    /// Rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rule description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the rule matches a masked line.
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    /// Byte offsets where the rule matches in `text`.
    pub fn find_offsets<'t>(&'t self, text: &'t str) -> impl Iterator<Item = usize> + 't {
        self.regex.find_iter(text).map(|m| m.start())
    }
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("name", &self.name)
            .field("pattern", &self.regex.as_str())
            .finish_non_exhaustive()
    }
}

static BUILTIN: LazyLock<RuleSet> = LazyLock::new(|| {
    RULES.iter().fold(RuleSet::empty(), |set, rule| {
        set.with_rule(rule.name, rule.pattern, rule.description)
            .expect("built-in rule patterns are valid")
    })
});

/// An ordered, compiled collection of rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// A set with no rules. Every source screens clean.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The compiled [`RULES`] table.
    #[must_use]
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Append a rule. Later rules report after earlier ones on the same line.
    ///
    /// # Errors
    ///
    /// Returns [`ScreenError::InvalidRule`] if `pattern` is not a valid regex.
    pub fn with_rule(
        mut self,
        name: impl Into<String>,
        pattern: &str,
        description: impl Into<String>,
    ) -> ScreenResult<Self> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|source| ScreenError::InvalidRule {
            name: name.clone(),
            source,
        })?;
        self.rules.push(CompiledRule {
            name,
            description: description.into(),
            regex,
        });
        Ok(self)
    }

    /// Rules in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matching(line: &str) -> Vec<String> {
        RuleSet::builtin()
            .iter()
            .filter(|r| r.matches(line))
            .map(|r| r.name().to_string())
            .collect()
    }

    #[test]
    fn test_builtin_compiles_every_rule() {
        assert_eq!(RuleSet::builtin().len(), RULES.len());
    }

    #[test]
    fn test_rules_hit_intended_calls() {
        assert_eq!(matching("subprocess.call(['ls'])"), vec!["subprocess.call"]);
        assert_eq!(matching("subprocess . run(cmd)"), vec!["subprocess.run"]);
        assert_eq!(matching("p = subprocess.Popen(args)"), vec!["subprocess.Popen"]);
        assert_eq!(matching("os.system ('ls')"), vec!["os.system"]);
        assert_eq!(matching("x = eval(s)"), vec!["eval"]);
        assert_eq!(matching("exec(code)"), vec!["exec"]);
        assert_eq!(matching("m = __import__('os')"), vec!["__import__"]);
    }

    #[test]
    fn test_word_boundaries_exclude_lookalikes() {
        assert!(matching("my_eval(x)").is_empty());
        assert!(matching("execute(query)").is_empty());
        assert!(matching("evaluate(x)").is_empty());
        assert!(matching("myos.system('x')").is_empty());
        assert!(matching("subprocess.runner()").is_empty());
        assert!(matching("import subprocess").is_empty());
    }

    #[test]
    fn test_with_rule_extends_and_rejects_bad_patterns() {
        let set = RuleSet::empty()
            .with_rule("shutil.rmtree", r"\bshutil\s*\.\s*rmtree\s*\(", "deletes trees")
            .unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.iter().next().unwrap().matches("shutil.rmtree(p)"));

        let err = RuleSet::empty().with_rule("bad", "(", "broken").unwrap_err();
        assert!(matches!(err, ScreenError::InvalidRule { .. }));
    }
}
