//! Trade domain errors.
//!
//! One taxonomy for the whole write path. Storage adapters map engine-level
//! failures into these variants so callers see domain semantics, not SQLite
//! result codes.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single violated validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Input field the rule applies to.
    pub field: &'static str,
    /// Short machine-readable constraint name.
    pub constraint: &'static str,
    /// Human-readable description of the violation.
    pub message: String,
}

impl Violation {
    /// Create a violation descriptor.
    #[must_use]
    pub fn new(field: &'static str, constraint: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            constraint,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The full set of validation rules an input violated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    violations: Vec<Violation>,
}

impl ValidationFailure {
    /// Wrap a non-empty list of violations.
    #[must_use]
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Wrap a single violation.
    #[must_use]
    pub fn single(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }

    /// The violated rules.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Errors from trade operations.
#[derive(Debug, Error)]
pub enum TradeError {
    /// Input failed one or more validation rules. Nothing was persisted and
    /// no audit entry was written.
    #[error("validation failed: {0}")]
    Validation(ValidationFailure),

    /// No trade exists with the given id.
    #[error("trade not found: {id}")]
    NotFound {
        /// The missing trade id.
        id: i64,
    },

    /// The persisted version moved between read and write. The caller must
    /// re-read and retry; the concurrent change is never overwritten.
    #[error("version conflict on trade {id}: read version {expected}, persisted version {persisted}")]
    ConcurrencyConflict {
        /// Trade id the update targeted.
        id: i64,
        /// Version the update was based on.
        expected: i64,
        /// Version currently persisted.
        persisted: i64,
    },

    /// A trade reference collided in storage. Structurally impossible while
    /// the sequence allocator is correct; surfaced as fatal, never retried.
    #[error("duplicate trade reference: {reference}")]
    UniquenessViolation {
        /// The colliding reference.
        reference: String,
    },

    /// The storage write lock could not be acquired within the configured
    /// bound. Retryable with backoff.
    #[error("storage busy: {0}")]
    Busy(String),

    /// Any other persistence failure. The enclosing unit of work was rolled
    /// back in full.
    #[error("storage failure: {0}")]
    Storage(String),

    /// An audit snapshot could not be serialized.
    #[error("snapshot serialization failed: {0}")]
    Snapshot(String),
}

impl TradeError {
    /// Shorthand for a single-violation validation error.
    #[must_use]
    pub fn validation(field: &'static str, constraint: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(ValidationFailure::single(Violation::new(
            field, constraint, message,
        )))
    }
}
