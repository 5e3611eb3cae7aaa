//! Second-level tables.
//!
//! A bucket of `k` keys gets `k²` slots. With that much room, a random member of the family is
//! injective on the bucket with probability at least `1/2`, so a couple of draws suffice.

use super::{
    algorithms::scatter,
    bitmap::BitMap,
    config::BuildConfig,
    error::{Error, Level},
    hash::UniversalHash,
    key::Key,
    sampling::rejection_sample,
};
use alloc::{boxed::Box, vec::Vec};
use core::{borrow::Borrow, num::NonZeroU32};
use rand::Rng;

/// A collision-free table for the keys of one first-level bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct Level2Table<K> {
    /// Injective on the keys of this table. Never evaluated when `slots` is empty.
    hash: UniversalHash,

    /// Keys indexed by their hash. `None` means no key hashes there.
    slots: Box<[Option<K>]>,
}

impl<K: Key> Level2Table<K> {
    /// Build a table for `keys`.
    ///
    /// The keys must have pairwise distinct residues modulo the family prime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttemptsExhausted`] if no injective function was found within the attempt
    /// cap.
    pub(crate) fn build<R: Rng + ?Sized>(
        keys: Vec<K>,
        config: &BuildConfig,
        rng: &mut R,
    ) -> Result<Self, Error> {
        let family = config.family();
        if keys.is_empty() {
            return Ok(Self {
                hash: UniversalHash::empty(family),
                slots: Box::new([]),
            });
        }
        #[allow(
            clippy::arithmetic_side_effects,
            reason = "the first level bounds the sum of squared bucket sizes by 4n"
        )]
        let capacity = keys.len() * keys.len();
        Self::from_candidates(
            keys,
            family.candidates(rng, capacity),
            config.max_attempts(),
        )
    }

    /// Build a table for non-empty `keys`, taking the first injective candidate.
    ///
    /// Every candidate must have range `keys.len()²`.
    fn from_candidates(
        keys: Vec<K>,
        candidates: impl IntoIterator<Item = UniversalHash>,
        max_attempts: Option<NonZeroU32>,
    ) -> Result<Self, Error> {
        #[allow(clippy::arithmetic_side_effects, reason = "checked by the caller")]
        let capacity = keys.len() * keys.len();
        let projections: Vec<u64> = keys.iter().map(Key::project).collect();
        let mut taken = BitMap::new_zeros(capacity);

        let (hash, ()) = rejection_sample(candidates, max_attempts, Level::Second, |hash| {
            taken.clear();
            projections
                .iter()
                .all(|&projection| taken.insert(hash.hash(projection)))
                .then_some(())
        })?;

        let mut slots: Vec<Option<K>> = (0..capacity).map(|_| None).collect();
        scatter(keys, |key| hash.hash(key.project()), &mut slots);
        Ok(Self {
            hash,
            slots: slots.into_boxed_slice(),
        })
    }
}

impl<K> Level2Table<K> {
    /// Look up a key by value and projection.
    pub(crate) fn get<Q>(&self, value: &Q, projection: u64) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if self.slots.is_empty() {
            return None;
        }
        self.slots[self.hash.hash(projection)]
            .as_ref()
            .filter(|&key| key.borrow() == value)
    }

    /// The hash function of this table.
    pub(crate) const fn hash(&self) -> &UniversalHash {
        &self.hash
    }

    /// Slots, including empty ones.
    pub(crate) fn slots(&self) -> &[Option<K>] {
        &self.slots
    }

    /// Number of stored keys.
    pub(crate) fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Number of slots, i.e. the square of [`len`](Self::len).
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }
}
