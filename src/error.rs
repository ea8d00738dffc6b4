//! Error types.
//!
//! The decision path itself never fails: "no usable link" is a [`Verdict`][crate::Verdict]
//! and a stale outcome is a no-op. Errors only come from constructing a
//! [`Strategy`][crate::Strategy] with an out-of-range [`Config`][crate::Config].

use thiserror::Error;

/// Crate error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A numeric parameter is outside its allowed range.
    #[error("invalid parameter `{name}` = {value}: expected {expected}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// Reward magnitudes must satisfy `drop < failure < 0 < success`.
    #[error("inconsistent rewards: drop ({drop}) must be below failure ({failure})")]
    InconsistentRewards { failure: f64, drop: f64 },
}

/// Result alias for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;
