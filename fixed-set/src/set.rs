//! Two-level perfect hash sets.

use super::{
    algorithms::{find_equal_pair, group_by_bucket},
    config::BuildConfig,
    error::{Error, Level},
    hash::UniversalHash,
    key::Key,
    level2::Level2Table,
    sampling::rejection_sample,
};
use alloc::{boxed::Box, vec::Vec};
use core::{borrow::Borrow, fmt, iter::FusedIterator, slice};
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// A static set with worst-case constant-time membership queries.
///
/// The first level hashes `n` keys into `n` buckets so that the squared bucket sizes add up to at
/// most `4n`. A bucket of `k` keys is then stored in its own collision-free table of `k²` slots.
/// A query evaluates two hash functions and compares one stored key, regardless of the input.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        bound(deserialize = "K: serde::Deserialize<'de> + Key"),
        try_from = "serde_support::Unvalidated<K>"
    )
)]
#[derive(Clone, PartialEq, Eq)]
pub struct FixedSet<K> {
    /// Maps keys to buckets. Its range is the number of keys.
    first: UniversalHash,

    /// One table per bucket, indexed by bucket.
    tables: Box<[Level2Table<K>]>,

    /// The number of keys.
    len: usize,
}

/// Bucket assignment produced while checking a first-level candidate.
struct Partition {
    /// Bucket of each key, in input order.
    buckets: Vec<usize>,

    /// Number of keys per bucket.
    sizes: Vec<usize>,
}

impl Partition {
    /// Distribute projections with `hash` and accept if the squared sizes add up to at most `4n`.
    fn try_new(hash: &UniversalHash, projections: &[u64]) -> Option<Self> {
        let mut sizes = alloc::vec![0usize; projections.len()];
        let buckets: Vec<usize> = projections
            .iter()
            .map(|&projection| {
                let bucket = hash.hash(projection);
                sizes[bucket] = sizes[bucket].saturating_add(1);
                bucket
            })
            .collect();
        let partition = Self { buckets, sizes };
        (partition.capacity() <= projections.len().saturating_mul(4)).then_some(partition)
    }

    /// Sum of squared bucket sizes, i.e. the number of second-level slots this partition needs.
    fn capacity(&self) -> usize {
        self.sizes
            .iter()
            .fold(0, |sum: usize, &size| sum.saturating_add(size.saturating_mul(size)))
    }
}

impl<K: Key + Eq> FixedSet<K> {
    /// Build a set, seeding the generator from the operating system.
    ///
    /// There must not be duplicate keys in the input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Entropy`] if the operating system has no randomness to offer, and otherwise
    /// fails like [`FixedSet::with_config`].
    #[cfg(feature = "std")]
    #[inline]
    pub fn new(keys: Vec<K>) -> Result<Self, Error> {
        let mut rng = SmallRng::from_rng(rand::rngs::OsRng)?;
        Self::with_rng(keys, &mut rng)
    }

    /// Build a set with the default configuration, drawing randomness from `rng`.
    ///
    /// # Errors
    ///
    /// See [`FixedSet::with_config`].
    #[inline]
    pub fn with_rng<R: Rng + ?Sized>(keys: Vec<K>, rng: &mut R) -> Result<Self, Error> {
        Self::with_config(keys, &BuildConfig::default(), rng)
    }

    /// Build a set.
    ///
    /// The same keys, configuration and generator state always produce the same set.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateKey`] if a key occurs twice.
    /// - [`Error::ResidueCollision`] if two keys are congruent modulo the family prime.
    /// - [`Error::AttemptsExhausted`] if either level ran out of attempts.
    #[inline] // heavy, but monomorphized anyway
    pub fn with_config<R: Rng + ?Sized>(
        keys: Vec<K>,
        config: &BuildConfig,
        rng: &mut R,
    ) -> Result<Self, Error> {
        let (first, groups, seeds) = Self::partition(keys, config, rng)?;
        let len = seeds.len();
        let tables = groups
            .into_iter()
            .zip(seeds)
            .map(|(group, seed)| {
                Level2Table::build(group, config, &mut SmallRng::seed_from_u64(seed))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self::assemble(first, tables, len))
    }

    /// Build a set, constructing the second-level tables in parallel.
    ///
    /// Produces exactly the set [`FixedSet::with_config`] would for the same arguments.
    ///
    /// # Errors
    ///
    /// See [`FixedSet::with_config`].
    #[cfg(feature = "parallel")]
    #[inline]
    pub fn par_with_config<R: Rng + ?Sized>(
        keys: Vec<K>,
        config: &BuildConfig,
        rng: &mut R,
    ) -> Result<Self, Error>
    where
        K: Send,
    {
        use rayon::prelude::*;

        let (first, groups, seeds) = Self::partition(keys, config, rng)?;
        let len = seeds.len();
        let tables = groups
            .into_par_iter()
            .zip(seeds)
            .map(|(group, seed)| {
                Level2Table::build(group, config, &mut SmallRng::seed_from_u64(seed))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self::assemble(first, tables, len))
    }

    /// Validate the keys, pick the first-level function and split the keys into buckets.
    ///
    /// Also draws one seed per bucket, in bucket order, so that second-level tables can be built in
    /// any order without changing the result.
    #[allow(
        clippy::type_complexity,
        reason = "private helper shared by the sequential and parallel builders"
    )]
    fn partition<R: Rng + ?Sized>(
        keys: Vec<K>,
        config: &BuildConfig,
        rng: &mut R,
    ) -> Result<(UniversalHash, Vec<Vec<K>>, Vec<u64>), Error> {
        let family = config.family();
        let projections: Vec<u64> = keys.iter().map(Key::project).collect();

        let residues: Vec<u64> = projections
            .iter()
            .map(|&projection| family.residue(projection))
            .collect();
        if let Some((first, second)) = find_equal_pair(&residues) {
            return Err(if keys[first] == keys[second] {
                Error::DuplicateKey { first, second }
            } else {
                Error::ResidueCollision { first, second }
            });
        }

        let (first, partition) = rejection_sample(
            family.candidates(rng, keys.len()),
            config.max_attempts(),
            Level::First,
            |hash| Partition::try_new(hash, &projections),
        )?;
        log::debug!(
            "first level accepted for {} keys, {} second-level slots",
            keys.len(),
            partition.capacity(),
        );

        let seeds = (0..keys.len()).map(|_| rng.gen()).collect();
        let groups = group_by_bucket(keys, &partition.buckets, &partition.sizes);
        Ok((first, groups, seeds))
    }

    /// Wrap up built tables.
    fn assemble(first: UniversalHash, tables: Vec<Level2Table<K>>, len: usize) -> Self {
        Self {
            first,
            tables: tables.into_boxed_slice(),
            len,
        }
    }
}

impl<K> FixedSet<K> {
    /// Get a reference to the stored key equal to `value`, if present.
    #[inline]
    pub fn get<Q>(&self, value: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Key + Eq,
    {
        if self.tables.is_empty() {
            return None;
        }
        let projection = value.project();
        self.tables[self.first.hash(projection)].get(value, projection)
    }

    /// Check if the set contains a value.
    #[inline]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Key + Eq,
    {
        self.get(value).is_some()
    }

    /// Get number of keys.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if the set is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate through keys, bucket by bucket.
    ///
    /// The order is unspecified, but is constant for a given set.
    #[inline]
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            tables: self.tables.iter(),
            slots: slice::Iter::default(),
            remaining: self.len,
        }
    }

    /// Iterate through buckets, yielding the keys of each.
    ///
    /// There is one bucket per key. Empty buckets are included.
    #[inline]
    pub fn buckets(&self) -> impl ExactSizeIterator<Item = impl Iterator<Item = &K>> {
        self.tables
            .iter()
            .map(|table| table.slots().iter().flatten())
    }

    /// Number of keys per bucket.
    #[inline]
    pub fn occupancy(&self) -> impl ExactSizeIterator<Item = usize> + '_ {
        self.tables.iter().map(Level2Table::len)
    }

    /// Total number of second-level slots.
    ///
    /// This is the sum of squared bucket sizes, at most four times [`len`](Self::len).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.tables.iter().map(Level2Table::capacity).sum()
    }

    /// The first-level hash function.
    #[inline]
    pub const fn first_level(&self) -> &UniversalHash {
        &self.first
    }

    /// The second-level hash function of each bucket.
    #[inline]
    pub fn second_level(&self) -> impl ExactSizeIterator<Item = &UniversalHash> {
        self.tables.iter().map(Level2Table::hash)
    }
}

impl<K: fmt::Debug> fmt::Debug for FixedSet<K> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, K> IntoIterator for &'a FixedSet<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    #[inline]
    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

/// Iterator over the keys of a [`FixedSet`].
#[derive(Clone, Debug)]
pub struct Iter<'a, K> {
    /// Tables not yet visited.
    tables: slice::Iter<'a, Level2Table<K>>,

    /// Rest of the current table.
    slots: slice::Iter<'a, Option<K>>,

    /// Keys not yet yielded.
    remaining: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        loop {
            if let Some(key) = self.slots.by_ref().flatten().next() {
                self.remaining = self.remaining.saturating_sub(1);
                return Some(key);
            }
            self.slots = self.tables.next()?.slots().iter();
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> FusedIterator for Iter<'_, K> {}

/// Scope for `serde`-related code.
#[cfg(feature = "serde")]
mod serde_support {
    use super::{FixedSet, Key, Level2Table, UniversalHash};
    use alloc::boxed::Box;
    use displaydoc::Display;
    use thiserror::Error;

    /// Deserialization validation failures.
    #[derive(Debug, Display, Error)]
    pub enum Error {
        /// wrong bucket count
        WrongBucketCount,

        /// wrong table capacity
        WrongTableCapacity,

        /// second-level slots exceed four times the number of keys
        ExcessiveCapacity,

        /// misplaced key
        MisplacedKey,

        /// wrong len
        WrongLen,
    }

    /// [`FixedSet`] fields as they appear on the wire, not yet validated.
    #[derive(serde::Deserialize)]
    pub struct Unvalidated<K> {
        /// See [`FixedSet::first`].
        first: UniversalHash,
        /// See [`FixedSet::tables`].
        tables: Box<[Level2Table<K>]>,
        /// See [`FixedSet::len`].
        len: usize,
    }

    impl<K: Key> TryFrom<Unvalidated<K>> for FixedSet<K> {
        type Error = Error;

        #[inline]
        fn try_from(raw: Unvalidated<K>) -> Result<Self, Error> {
            if raw.first.range() != raw.tables.len() {
                return Err(Error::WrongBucketCount);
            }

            let mut len: usize = 0;
            let mut capacity: usize = 0;
            for (bucket, table) in raw.tables.iter().enumerate() {
                let occupied = table.len();
                if table.hash().range() != table.capacity()
                    || occupied.checked_mul(occupied) != Some(table.capacity())
                {
                    return Err(Error::WrongTableCapacity);
                }
                len = len.saturating_add(occupied);
                capacity = capacity.saturating_add(table.capacity());

                for (index, slot) in table.slots().iter().enumerate() {
                    if let Some(key) = slot {
                        let projection = key.project();
                        if raw.first.hash(projection) != bucket
                            || table.hash().hash(projection) != index
                        {
                            return Err(Error::MisplacedKey);
                        }
                    }
                }
            }

            if len != raw.len {
                return Err(Error::WrongLen);
            }
            if capacity > len.saturating_mul(4) {
                return Err(Error::ExcessiveCapacity);
            }

            Ok(Self {
                first: raw.first,
                tables: raw.tables,
                len: raw.len,
            })
        }
    }
}
