//! Projection of keys onto integers.
//!
//! The hash family in [`hash`](crate::hash) works on 64-bit integers, so every key is projected to
//! a `u64` first. Unsigned integers project to themselves and signed integers are zigzag-encoded,
//! so the projection does not depend on the width of the integer type and every 32-bit integer
//! projects below `2^33`. Strings and byte strings are hashed with rapidhash under a fixed seed.
//!
//! Byte-string projections can collide. Construction detects this and fails with
//! [`Error::ResidueCollision`](crate::Error::ResidueCollision) instead of looping forever.

use core::hash::Hasher;
use rapidhash::RapidHasher;

/// A value that can be stored in a [`FixedSet`](crate::FixedSet).
///
/// # Requirements
///
/// - `Eq`-equal values must project to equal integers.
/// - If `T: Borrow<U>` and both implement `Key`, `x` and `x.borrow()` must project equally. This is
///   what makes `set.contains("abc")` work on a `FixedSet<String>`.
/// - The projection should be injective on the keys of a set. Collisions are reported during
///   construction, never at query time.
pub trait Key {
    /// Project the key onto a 64-bit integer.
    fn project(&self) -> u64;
}

impl<T: ?Sized + Key> Key for &T {
    #[inline]
    fn project(&self) -> u64 {
        (**self).project()
    }
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {
        $(
            impl Key for $ty {
                #[inline]
                #[allow(clippy::cast_lossless, reason = "generic code")]
                fn project(&self) -> u64 {
                    *self as u64
                }
            }
        )*
    };
}
impl_unsigned!(u8, u16, u32, u64, usize, bool);

/// Zigzag encoding: `0, -1, 1, -2, 2, ...` map to `0, 1, 2, 3, 4, ...`.
///
/// Small magnitudes stay small, so narrow signed keys never wrap around the family prime.
#[allow(clippy::cast_sign_loss, reason = "bit reinterpretation")]
const fn zigzag(value: i64) -> u64 {
    ((value << 1i32) ^ (value >> 63i32)) as u64
}

macro_rules! impl_signed {
    ($($ty:ty),*) => {
        $(
            impl Key for $ty {
                #[inline]
                #[allow(clippy::cast_lossless, reason = "generic code")]
                fn project(&self) -> u64 {
                    zigzag(*self as i64)
                }
            }
        )*
    };
}
impl_signed!(i8, i16, i32, i64, isize);

impl Key for char {
    #[inline]
    fn project(&self) -> u64 {
        u64::from(u32::from(*self))
    }
}

/// Hexadecimal digits of e - 2.
const BYTES_SEED: u64 = 0xb7e1_5162_8aed_2a6a;

/// Project a byte string.
fn project_bytes(bytes: &[u8]) -> u64 {
    let mut state = RapidHasher::new(BYTES_SEED);
    state.write(bytes);
    state.finish()
}

impl Key for [u8] {
    #[inline]
    fn project(&self) -> u64 {
        project_bytes(self)
    }
}

impl Key for str {
    #[inline]
    fn project(&self) -> u64 {
        project_bytes(self.as_bytes())
    }
}

impl Key for alloc::vec::Vec<u8> {
    #[inline]
    fn project(&self) -> u64 {
        project_bytes(self)
    }
}

impl Key for alloc::string::String {
    #[inline]
    fn project(&self) -> u64 {
        project_bytes(self.as_bytes())
    }
}
