//! # Error — Typed Failure Kinds for the Core
//!
//! Error kinds surfaced by the core.
//!
//! The rest of this crate favours `anyhow::Result` for internal plumbing,
//! but every public entry point returns `Result<T, PrimeError>` so callers
//! can match on the specific failure instead of downcasting.

use std::fmt;

/// The six error kinds the core can surface.
#[derive(Debug)]
pub enum PrimeError {
    /// An allocation failed.
    OutOfMemory,
    /// A caller-supplied argument violated a documented precondition.
    InvalidArgument(String),
    /// A file open/read/write failed.
    IoFailure(std::io::Error),
    /// A SHA-256 digest stored alongside data did not match on read.
    IntegrityFailure { expected: String, actual: String },
    /// `solve_for_y` was asked to solve a congruence with gcd(vx, p) != 1.
    NoSolution,
    /// `random_iZprime` exhausted `attempts_limit` probable-prime tests
    /// without success. Always handled internally by retrying; never
    /// returned across the public API.
    SearchExhausted,
}

impl fmt::Display for PrimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimeError::OutOfMemory => write!(f, "allocation failed"),
            PrimeError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            PrimeError::IoFailure(e) => write!(f, "I/O failure: {e}"),
            PrimeError::IntegrityFailure { expected, actual } => write!(
                f,
                "integrity check failed: expected sha256 {expected}, got {actual}"
            ),
            PrimeError::NoSolution => write!(f, "no solution: gcd(vx, p) != 1"),
            PrimeError::SearchExhausted => write!(f, "search exhausted attempts_limit"),
        }
    }
}

impl std::error::Error for PrimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PrimeError::IoFailure(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PrimeError {
    fn from(e: std::io::Error) -> Self {
        PrimeError::IoFailure(e)
    }
}

/// Convenience alias used by every public, fallible operation in this crate.
pub type Result<T> = std::result::Result<T, PrimeError>;
