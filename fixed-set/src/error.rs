//! Construction failures.

use displaydoc::Display;
use thiserror::Error;

/// One of the two rejection-sampling loops.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Level {
    /// first-level
    First,

    /// second-level
    Second,
}

/// Reasons a [`FixedSet`](crate::FixedSet) could not be built.
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum Error {
    /// modulus {modulus} is not prime
    NotPrime {
        /// The rejected modulus.
        modulus: u64,
    },

    /// keys at positions {first} and {second} are equal
    DuplicateKey {
        /// Position of the earlier copy in the input.
        first: usize,
        /// Position of the later copy in the input.
        second: usize,
    },

    /// keys at positions {first} and {second} are congruent modulo the family prime
    ResidueCollision {
        /// Position of the earlier key in the input. No member of the family can separate it from
        /// the later one; a larger prime can.
        first: usize,
        /// Position of the later key in the input.
        second: usize,
    },

    /// no acceptable {level} hash function after {attempts} attempts
    AttemptsExhausted {
        /// The loop that gave up.
        level: Level,
        /// Number of candidates that were drawn and rejected.
        attempts: u32,
    },

    /// ran out of {level} hash function candidates
    CandidatesExhausted {
        /// The loop whose candidate sequence ended.
        level: Level,
    },

    /// failed to seed from the operating system: {0}
    #[cfg(feature = "std")]
    Entropy(#[from] rand::Error),
}
