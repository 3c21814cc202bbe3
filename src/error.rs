//! Error types for the stat engine.
//!
//! Only configuration problems are reported as hard failures. Lookup
//! misses and formula failures are recovered where they happen (logged,
//! then resolved to a fallback value); the variants exist so that the
//! fallible `try_*` accessors and the formula adapter can describe them.

use crate::stat_id::StatId;
use thiserror::Error;

/// Format a cycle path as a readable string.
fn format_cycle_path(path: &[StatId]) -> String {
    if path.is_empty() {
        return String::from("(empty cycle)");
    }
    path.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors produced by the stat engine.
///
/// # Examples
///
/// ```rust
/// use statforge::{StatError, StatId};
///
/// let err = StatError::DuplicateStat(StatId::from_str("Health"));
/// assert_eq!(err.to_string(), "Duplicate stat: Health");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatError {
    /// Two stats in one container share an identifier.
    #[error("Duplicate stat: {0}")]
    DuplicateStat(StatId),

    /// The formula graph contains a cycle between two or more stats.
    ///
    /// The path is closed, e.g. `[A, B, A]` when A references B and B
    /// references A.
    #[error("Cycle detected: {}", format_cycle_path(.path))]
    Cycle { path: Vec<StatId> },

    /// The requested stat is not part of the container.
    #[error("Missing stat: {0}")]
    MissingStat(StatId),

    /// A formula failed to parse or evaluate.
    #[error("Invalid formula `{formula}`: {message}")]
    Formula { formula: String, message: String },

    /// A configuration document could not be read.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for StatError {
    fn from(err: serde_json::Error) -> Self {
        StatError::Config(err.to_string())
    }
}
