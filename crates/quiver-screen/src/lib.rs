//! Quiver Screen - static screening of Python scripts before they run.
//!
//! Screening is a best-effort, pattern-based check, not a sandbox. The source
//! is first masked so that comments and string literals cannot trigger or
//! hide a match, then an ordered table of rules is applied line by line.
//!
//! # Example
//!
//! ```
//! use quiver_core::ValidationVerdict;
//! use quiver_screen::validate_source;
//!
//! assert_eq!(validate_source(b"print('hi')\n"), ValidationVerdict::Clean);
//!
//! let verdict = validate_source(b"import os\nos.system('ls')\n");
//! assert_eq!(verdict.reasons()[0].line, 2);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod lexer;
pub mod rules;
pub mod validator;

pub use error::{ScreenError, ScreenResult};
pub use rules::{RULES, Rule, RuleSet};
pub use validator::{Validator, validate_source};
