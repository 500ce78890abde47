//! Error types for the Hermes middleware stack.
//!
//! The stack engine has a small, closed taxonomy. [`StackError::DuplicateName`]
//! and [`StackError::OverrideMismatch`] are raised synchronously at
//! registration and never at resolution; [`StackError::AnchorNotFound`] and
//! [`StackError::CyclicPosition`] are raised only by execution-mode
//! resolution. All of them are fatal to the failing call and leave the stack
//! exactly as it was: callers should treat them as misconfiguration rather
//! than transient conditions.

use thiserror::Error;

/// Result type alias using [`StackError`].
pub type StackResult<T> = Result<T, StackError>;

/// Errors produced by middleware stack registration and resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    /// A name or alias is already claimed by another entry and no override
    /// was requested.
    #[error("duplicate middleware name '{name}'")]
    DuplicateName {
        /// The colliding name or alias.
        name: String,
    },

    /// An override was requested but the existing entry's structural fields
    /// (phase/priority, or anchor/relation) differ from the new entry's.
    #[error("middleware '{name}' cannot be overridden: {reason}")]
    OverrideMismatch {
        /// The colliding name or alias.
        name: String,
        /// Which structural fields disagreed.
        reason: String,
    },

    /// A relative entry names an anchor that does not exist in the stack.
    ///
    /// Raised only by execution-mode resolution; inspection silently skips
    /// dangling entries instead.
    #[error("'{anchor}' is not found when positioning {orphan}")]
    AnchorNotFound {
        /// The missing anchor name.
        anchor: String,
        /// The orphaned entry, rendered with its aliases.
        orphan: String,
    },

    /// Relative anchoring forms a cycle, directly or transitively.
    #[error("cyclic middleware positioning detected at '{name}'")]
    CyclicPosition {
        /// The entry revisited before its expansion completed.
        name: String,
    },
}
