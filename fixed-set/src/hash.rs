//! The universal hash family `((a·x + b) mod p) mod m`.
//!
//! A [`HashFamily`] fixes the prime `p`. Sampling draws the multiplier `a` from `[1, p - 1]` and
//! the offset `b` from `[0, p - 1]`, producing a [`UniversalHash`] onto `[0, m)`. For two keys with
//! different residues modulo `p`, the probability that a sampled function maps them to the same
//! index is at most about `1 / m`, which is all the two-level construction needs.

use super::error::Error;
use rand::Rng;

/// A family of universal hash functions over a fixed prime modulus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u64", into = "u64"))]
pub struct HashFamily {
    /// The modulus `p`. Always prime.
    prime: u64,
}

impl HashFamily {
    /// The family modulo the Mersenne prime `2^61 - 1`.
    ///
    /// Every projection of a 32-bit integer, signed or unsigned, is below this prime, so such keys
    /// always have distinct residues.
    pub const MERSENNE_61: Self = Self {
        prime: (1u64 << 61i32) - 1,
    };

    /// Create a family over the given modulus.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotPrime`] if `prime` is not a prime number.
    #[inline]
    pub fn new(prime: u64) -> Result<Self, Error> {
        if is_prime(prime) {
            Ok(Self { prime })
        } else {
            Err(Error::NotPrime { modulus: prime })
        }
    }

    /// The modulus `p`.
    #[inline]
    #[must_use]
    pub const fn prime(&self) -> u64 {
        self.prime
    }

    /// Reduce a key projection modulo `p`.
    ///
    /// Keys with equal residues are indistinguishable to every member of the family.
    #[inline]
    #[must_use]
    pub const fn residue(&self, projection: u64) -> u64 {
        projection % self.prime
    }

    /// Draw a random member of the family with range `[0, range)`.
    ///
    /// `range` may be zero, in which case the function must never be evaluated.
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, range: usize) -> UniversalHash {
        UniversalHash {
            multiplier: rng.gen_range(1..self.prime),
            offset: rng.gen_range(0..self.prime),
            prime: self.prime,
            range,
        }
    }

    /// An infinite stream of random members with range `[0, range)`.
    #[inline]
    pub fn candidates<'rng, R: Rng + ?Sized>(
        self,
        rng: &'rng mut R,
        range: usize,
    ) -> impl Iterator<Item = UniversalHash> + 'rng {
        core::iter::repeat_with(move || self.sample(rng, range))
    }
}

impl TryFrom<u64> for HashFamily {
    type Error = Error;

    #[inline]
    fn try_from(prime: u64) -> Result<Self, Error> {
        Self::new(prime)
    }
}

impl From<HashFamily> for u64 {
    #[inline]
    fn from(family: HashFamily) -> Self {
        family.prime
    }
}

impl Default for HashFamily {
    #[inline]
    fn default() -> Self {
        Self::MERSENNE_61
    }
}

/// A member of a [`HashFamily`]: `x ↦ ((a·x + b) mod p) mod m`.
///
/// Two functions are equal iff their `(a, b, p, m)` tuples are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "serde_support::RawUniversalHash"))]
pub struct UniversalHash {
    /// `a`, in `[1, p - 1]`.
    multiplier: u64,

    /// `b`, in `[0, p - 1]`.
    offset: u64,

    /// `p`.
    prime: u64,

    /// `m`.
    range: usize,
}

impl UniversalHash {
    /// Assemble a function from explicit parameters.
    ///
    /// Returns `None` unless `multiplier` is in `[1, p - 1]` and `offset` is in `[0, p - 1]`.
    #[inline]
    #[must_use]
    pub const fn new(family: HashFamily, multiplier: u64, offset: u64, range: usize) -> Option<Self> {
        if multiplier == 0 || multiplier >= family.prime || offset >= family.prime {
            return None;
        }
        Some(Self {
            multiplier,
            offset,
            prime: family.prime,
            range,
        })
    }

    /// A function onto the empty range, for tables that hold nothing.
    pub(crate) const fn empty(family: HashFamily) -> Self {
        Self {
            multiplier: 1,
            offset: 0,
            prime: family.prime,
            range: 0,
        }
    }

    /// Hash a key projection into `[0, range)`.
    ///
    /// # Panics
    ///
    /// Panics if the range is empty.
    #[inline]
    #[must_use]
    #[allow(
        clippy::arithmetic_side_effects,
        reason = "a·x + b < 2^128 for 64-bit operands"
    )]
    #[allow(clippy::cast_possible_truncation, reason = "the result is below range")]
    pub const fn hash(&self, projection: u64) -> usize {
        let mixed = (self.multiplier as u128 * projection as u128 + self.offset as u128)
            % self.prime as u128;
        (mixed % self.range as u128) as usize
    }

    /// The multiplier `a`.
    #[inline]
    #[must_use]
    pub const fn multiplier(&self) -> u64 {
        self.multiplier
    }

    /// The offset `b`.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// The family this function belongs to.
    #[inline]
    #[must_use]
    pub const fn family(&self) -> HashFamily {
        HashFamily { prime: self.prime }
    }

    /// The size `m` of the output range.
    #[inline]
    #[must_use]
    pub const fn range(&self) -> usize {
        self.range
    }
}

/// `a · b mod m` without overflow.
#[allow(clippy::arithmetic_side_effects, reason = "fits in 128 bits, m != 0")]
#[allow(clippy::cast_possible_truncation, reason = "the result is below m")]
const fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    (a as u128 * b as u128 % m as u128) as u64
}

/// `base^exponent mod m` by repeated squaring.
const fn pow_mod(mut base: u64, mut exponent: u64, m: u64) -> u64 {
    let mut result = 1;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        base = mul_mod(base, base, m);
        exponent >>= 1i32;
    }
    result
}

/// Deterministic Miller-Rabin test.
///
/// The first twelve primes as witnesses are enough for every 64-bit integer.
#[allow(clippy::arithmetic_side_effects, reason = "n > 37 after trial division")]
fn is_prime(n: u64) -> bool {
    const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    if n < 2 {
        return false;
    }
    for witness in WITNESSES {
        if n % witness == 0 {
            return n == witness;
        }
    }

    let shift = (n - 1).trailing_zeros();
    let odd = (n - 1) >> shift;
    'witness: for witness in WITNESSES {
        let mut x = pow_mod(witness, odd, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..shift {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Scope for `serde`-related code.
#[cfg(feature = "serde")]
mod serde_support {
    use super::{is_prime, UniversalHash};
    use displaydoc::Display;
    use thiserror::Error;

    /// Deserialization validation failures.
    #[derive(Debug, Display, Error)]
    pub enum Error {
        /// modulus is not prime
        NotPrime,

        /// multiplier out of range
        MultiplierOutOfRange,

        /// offset out of range
        OffsetOutOfRange,
    }

    /// [`UniversalHash`] fields as they appear on the wire, not yet validated.
    #[derive(serde::Deserialize)]
    pub struct RawUniversalHash {
        /// `a`.
        multiplier: u64,
        /// `b`.
        offset: u64,
        /// `p`.
        prime: u64,
        /// `m`.
        range: usize,
    }

    impl TryFrom<RawUniversalHash> for UniversalHash {
        type Error = Error;

        #[inline]
        fn try_from(raw: RawUniversalHash) -> Result<Self, Error> {
            if !is_prime(raw.prime) {
                return Err(Error::NotPrime);
            }
            if raw.multiplier == 0 || raw.multiplier >= raw.prime {
                return Err(Error::MultiplierOutOfRange);
            }
            if raw.offset >= raw.prime {
                return Err(Error::OffsetOutOfRange);
            }
            Ok(Self {
                multiplier: raw.multiplier,
                offset: raw.offset,
                prime: raw.prime,
                range: raw.range,
            })
        }
    }
}
