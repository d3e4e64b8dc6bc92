//! Quiver Approval - the human-in-the-loop gate in front of script execution.
//!
//! Two pieces:
//! - [`SessionAcknowledgments`]: which flagged scripts the user has agreed to
//!   run during this session.
//! - [`decide`]: the pure gate policy combining a verdict, the author's
//!   `Validated` marker and the acknowledgment state.
//!
//! # Example
//!
//! ```
//! use quiver_approval::{SessionAcknowledgments, decide};
//! use quiver_core::{FlagReason, GateDecision, ScriptPath, ValidationVerdict};
//!
//! let acks = SessionAcknowledgments::new();
//! let path = ScriptPath::new("/scripts/cleanup.py");
//! let verdict = ValidationVerdict::Flagged(vec![FlagReason {
//!     rule: "os.system".into(),
//!     line: 3,
//!     excerpt: "os.system('rm -rf build')".into(),
//! }]);
//!
//! let first = decide(&verdict, true, acks.is_acknowledged(&path));
//! assert!(matches!(first, GateDecision::RequiresAcknowledgment { .. }));
//!
//! acks.acknowledge(&path);
//! assert_eq!(decide(&verdict, true, acks.is_acknowledged(&path)), GateDecision::Allowed);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod gate;
pub mod session;

pub use gate::decide;
pub use session::SessionAcknowledgments;
