//! Static screening verdicts and the run gate outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One dangerous-operation match found in a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagReason {
    /// Rule name, e.g. `os.system`.
    pub rule: String,
    /// 1-based line number of the match.
    pub line: usize,
    /// The offending source line, trimmed.
    pub excerpt: String,
}

impl fmt::Display for FlagReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} ({})", self.line, self.rule, self.excerpt)
    }
}

/// Result of statically screening a script's source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ValidationVerdict {
    /// No dangerous operations found.
    Clean,
    /// One or more dangerous operations found, in file order.
    Flagged(Vec<FlagReason>),
    /// The source could not be analyzed.
    ParseFailed(String),
}

impl ValidationVerdict {
    /// Whether the verdict is [`Clean`](Self::Clean).
    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// Flag reasons, empty unless [`Flagged`](Self::Flagged).
    #[must_use]
    pub fn reasons(&self) -> &[FlagReason] {
        match self {
            Self::Flagged(reasons) => reasons,
            _ => &[],
        }
    }
}

impl fmt::Display for ValidationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Flagged(reasons) => write!(f, "flagged ({} finding(s))", reasons.len()),
            Self::ParseFailed(msg) => write!(f, "unparseable: {msg}"),
        }
    }
}

/// Whether a script may run right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    /// Run may proceed.
    Allowed,
    /// The caller must obtain an explicit acknowledgment first.
    RequiresAcknowledgment {
        /// Findings to show the user.
        reasons: Vec<FlagReason>,
    },
    /// The script must not run.
    Blocked {
        /// Why the run is refused.
        reason: String,
    },
}

impl GateDecision {
    /// Whether the run may proceed without further interaction.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}
