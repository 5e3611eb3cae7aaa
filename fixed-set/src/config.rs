//! Construction parameters.

use super::hash::HashFamily;
use core::num::NonZeroU32;

/// How a [`FixedSet`](crate::FixedSet) is built.
///
/// Each sampled candidate is accepted with probability at least `1/2`, so the default cap of
/// [`BuildConfig::DEFAULT_MAX_ATTEMPTS`] candidates per loop fails with probability at most
/// `2^-256` per loop. The cap applies separately to the first level and to every second-level
/// table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BuildConfig {
    /// The hash family both levels sample from.
    family: HashFamily,

    /// Candidates to try per loop before giving up. `None` retries forever.
    max_attempts: Option<NonZeroU32>,
}

impl BuildConfig {
    /// The attempt cap used by [`BuildConfig::default`].
    pub const DEFAULT_MAX_ATTEMPTS: NonZeroU32 = match NonZeroU32::new(256) {
        Some(n) => n,
        None => panic!("zero attempts"),
    };

    /// Default family, default attempt cap.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            family: HashFamily::MERSENNE_61,
            max_attempts: Some(Self::DEFAULT_MAX_ATTEMPTS),
        }
    }

    /// Sample from another hash family.
    #[inline]
    #[must_use]
    pub const fn with_family(mut self, family: HashFamily) -> Self {
        self.family = family;
        self
    }

    /// Give up after `max_attempts` rejected candidates in a single loop.
    #[inline]
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: NonZeroU32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Never give up.
    ///
    /// Construction then has no worst-case bound on its running time. Keys that no member of the
    /// family can separate are still reported, since that is checked before sampling.
    #[inline]
    #[must_use]
    pub const fn unbounded(mut self) -> Self {
        self.max_attempts = None;
        self
    }

    /// The hash family.
    #[inline]
    #[must_use]
    pub const fn family(&self) -> HashFamily {
        self.family
    }

    /// The attempt cap, if any.
    #[inline]
    #[must_use]
    pub const fn max_attempts(&self) -> Option<NonZeroU32> {
        self.max_attempts
    }
}

impl Default for BuildConfig {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
