//! The closed error taxonomy of the library.
//!
//! Every fallible operation returns [`Error`] through the crate-wide
//! [`Result`] alias. The set of variants is deliberately small: callers are
//! expected to match on it, and strategy execution maps every failure onto
//! one of these kinds.

use serde::Serialize;
use std::fmt;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// All error kinds the library can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Error {
    /// Malformed input: a file that does not follow the format, user arrays
    /// that break a graph invariant, or impossible parameter values.
    InvalidInput(String),

    /// An allocation size overflowed or a guarded reservation failed.
    OutOfMemory(String),

    /// Syntax or type error in a strategy string, with source position.
    StrategyParse {
        /// 1-based line of the offending token.
        line: u32,
        /// 1-based column of the offending token.
        column: u32,
        /// Human-readable description.
        message: String,
    },

    /// A strategy failed at run time: a method was applied to an active
    /// object it cannot handle, or a dynamically built tree is ill-shaped.
    StrategyRuntime(String),

    /// Numerical breakdown, e.g. overflow in the diffusion process.
    NumericFailure(String),

    /// Internal invariant violation. Produced by debug consistency checks
    /// only; release builds should be unable to emit this.
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::OutOfMemory(msg) => write!(f, "out of memory: {msg}"),
            Error::StrategyParse {
                line,
                column,
                message,
            } => {
                write!(f, "strategy parse error at {line}:{column}: {message}")
            }
            Error::StrategyRuntime(msg) => write!(f, "strategy runtime error: {msg}"),
            Error::NumericFailure(msg) => write!(f, "numeric failure: {msg}"),
            Error::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Shorthand for an [`Error::InvalidInput`] with a formatted message.
    pub(crate) fn input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Shorthand for an [`Error::Internal`] with a formatted message.
    pub(crate) fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }
}
