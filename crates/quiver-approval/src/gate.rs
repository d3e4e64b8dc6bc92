//! The run gate policy.

use quiver_core::{GateDecision, ValidationVerdict};

/// Decide whether a script may run.
///
/// - `ParseFailed` is always blocked.
/// - `Clean` is always allowed.
/// - `Flagged` is allowed only once acknowledged this session. The author's
///   `validated` marker does not waive the first acknowledgment.
#[must_use]
pub fn decide(verdict: &ValidationVerdict, validated: bool, acknowledged: bool) -> GateDecision {
    match verdict {
        ValidationVerdict::ParseFailed(reason) => GateDecision::Blocked {
            reason: format!("script could not be analyzed: {reason}"),
        },
        ValidationVerdict::Clean => GateDecision::Allowed,
        ValidationVerdict::Flagged(_) if acknowledged => GateDecision::Allowed,
        ValidationVerdict::Flagged(reasons) => {
            tracing::debug!(
                validated,
                findings = reasons.len(),
                "Flagged script needs acknowledgment"
            );
            GateDecision::RequiresAcknowledgment {
                reasons: reasons.clone(),
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_core::FlagReason;

    fn flagged() -> ValidationVerdict {
        ValidationVerdict::Flagged(vec![FlagReason {
            rule: "eval".into(),
            line: 1,
            excerpt: "eval(x)".into(),
        }])
    }

    #[test]
    fn test_clean_always_allowed() {
        for validated in [false, true] {
            for acknowledged in [false, true] {
                assert_eq!(
                    decide(&ValidationVerdict::Clean, validated, acknowledged),
                    GateDecision::Allowed
                );
            }
        }
    }

    #[test]
    fn test_parse_failure_always_blocked() {
        let verdict = ValidationVerdict::ParseFailed("unterminated string literal starting at line 4".into());
        for acknowledged in [false, true] {
            assert!(matches!(
                decide(&verdict, true, acknowledged),
                GateDecision::Blocked { ref reason } if reason.contains("line 4")
            ));
        }
    }

    #[test]
    fn test_flagged_requires_ack_even_when_validated() {
        for validated in [false, true] {
            match decide(&flagged(), validated, false) {
                GateDecision::RequiresAcknowledgment { reasons } => {
                    assert_eq!(reasons[0].rule, "eval");
                },
                other => panic!("expected acknowledgment request, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_flagged_allowed_after_ack() {
        assert_eq!(decide(&flagged(), false, true), GateDecision::Allowed);
        assert_eq!(decide(&flagged(), true, true), GateDecision::Allowed);
    }
}
