//! Static sets with worst-case constant-time membership queries.
//!
//! [`FixedSet`] implements the two-level perfect hashing scheme of Fredman, Komlós and Szemerédi.
//! A set is built once from a list of distinct keys and never changes afterwards. Lookups evaluate
//! two hash functions and compare a single stored key, so they take constant time in the worst
//! case. The structure uses linear space and is built in expected linear time.
//!
//! # Construction
//!
//! Both levels draw hash functions from a universal family ([`hash`]) and keep the first one that
//! passes a check:
//!
//! 1. The first level maps `n` keys to `n` buckets. It is accepted if the squared bucket sizes add
//!    up to at most `4n`.
//! 2. A bucket with `k` keys gets a table of `k²` slots. Its function is accepted if it maps the
//!    bucket's keys to distinct slots.
//!
//! A random candidate passes either check with probability at least `1/2`. Construction is
//! deterministic given the state of the random generator, and the number of attempts per loop is
//! capped by [`BuildConfig`].
//!
//! # Usage
//!
//! ```
//! use fixed_set::FixedSet;
//! use rand::{rngs::SmallRng, SeedableRng};
//!
//! let mut rng = SmallRng::seed_from_u64(0x5eed);
//! let set = FixedSet::with_rng((1..=12).collect::<Vec<i32>>(), &mut rng)?;
//! assert!(set.contains(&3));
//! assert!(!set.contains(&13));
//! assert!(!set.contains(&-5));
//! # Ok::<(), fixed_set::Error>(())
//! ```
//!
//! Keys are anything implementing [`Key`]: integers, `char`, `bool`, strings and byte strings.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod algorithms;
pub(crate) mod bitmap;
mod config;
mod error;
pub mod hash;
mod key;
mod level2;
pub(crate) mod sampling;
mod set;

pub use config::BuildConfig;
pub use error::{Error, Level};
pub use key::Key;
pub use set::{FixedSet, Iter};

#[cfg(test)]
mod tests;
