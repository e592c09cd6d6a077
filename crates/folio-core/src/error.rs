//! Construction-time errors for timing and visibility primitives.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Zero throttle limit | `Duration::ZERO` window | `InvalidArgument` |
//! | Bad threshold | NaN, infinite, or outside `[0, 1]` | `InvalidArgument` |
//! | Bad margin | Non-finite edge value | `InvalidArgument` |
//! | Bad margin shorthand | Wrong arity or unit | `Parse` |
//!
//! Errors are raised when a primitive is built, never when it is triggered.

use std::fmt;

/// Errors from building timing or visibility primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimingError {
    /// An argument was outside its valid domain.
    InvalidArgument {
        /// Name of the offending argument.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },
    /// A textual value (e.g. a root-margin shorthand) could not be parsed.
    Parse {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl TimingError {
    /// Build an [`InvalidArgument`](Self::InvalidArgument) error.
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// Build a [`Parse`](Self::Parse) error.
    pub fn parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TimingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { name, reason } => {
                write!(f, "invalid argument '{name}': {reason}")
            }
            Self::Parse { input, reason } => write!(f, "cannot parse '{input}': {reason}"),
        }
    }
}

impl std::error::Error for TimingError {}
