//! Error taxonomy for the significance-testing engine.
//!
//! Invalid input fails fast, before any resampling work begins. Degenerate
//! statistics (zero within-group variance, all-identical pooled values) are
//! defined results, not errors.

use thiserror::Error;

/// Errors surfaced by the statistics engine.
#[derive(Debug, Error)]
pub enum StatError {
    /// No sample groups were supplied.
    #[error("no sample groups provided")]
    NoGroups,

    /// A group contained zero observations.
    #[error("group '{0}' has no observations")]
    EmptyGroup(String),

    /// Two groups share the same label within one invocation.
    #[error("duplicate group label '{0}'")]
    DuplicateLabel(String),

    /// A NaN or infinite value reached the engine. Missing values must be
    /// filtered out by the data-preparation side.
    #[error("non-finite value in group '{label}' at index {index}")]
    NonFiniteValue {
        /// Label of the offending group.
        label: String,
        /// Position of the value within the group.
        index: usize,
    },

    /// The permutation count must be a positive integer.
    #[error("permutation count must be positive")]
    ZeroPermutations,

    /// Total observations must exceed the group count, otherwise the
    /// within-group degrees of freedom are non-positive.
    #[error("insufficient degrees of freedom: {n} observations across {k} groups")]
    InsufficientObservations {
        /// Total observation count.
        n: usize,
        /// Number of groups.
        k: usize,
    },
}
