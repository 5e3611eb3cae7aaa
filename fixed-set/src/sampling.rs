//! Rejection sampling.
//!
//! Both levels of the construction search for a hash function by the same loop: draw a candidate,
//! verify it, keep it or throw it away. The loop is independent of where candidates come from, so
//! tests can feed it hand-picked sequences.

use super::error::{Error, Level};
use core::num::NonZeroU32;

/// Return the first candidate accepted by `verify`, together with the verdict.
///
/// `verify` returns `Some` to accept a candidate. Anything it computes while checking (occupancy
/// counts, say) can be handed back through the verdict instead of being recomputed.
///
/// # Errors
///
/// - [`Error::AttemptsExhausted`] once `max_attempts` candidates were rejected.
/// - [`Error::CandidatesExhausted`] if `candidates` ends before a candidate is accepted.
pub(crate) fn rejection_sample<C, V>(
    candidates: impl IntoIterator<Item = C>,
    max_attempts: Option<NonZeroU32>,
    level: Level,
    mut verify: impl FnMut(&C) -> Option<V>,
) -> Result<(C, V), Error> {
    let mut attempts: u32 = 0;
    for candidate in candidates {
        attempts = attempts.saturating_add(1);
        if let Some(verdict) = verify(&candidate) {
            log::trace!("{level} candidate accepted after {attempts} attempt(s)");
            return Ok((candidate, verdict));
        }
        log::trace!("{level} candidate {attempts} rejected");
        if max_attempts.is_some_and(|cap| attempts >= cap.get()) {
            log::warn!("giving up on {level} hash function after {attempts} attempts");
            return Err(Error::AttemptsExhausted { level, attempts });
        }
    }
    Err(Error::CandidatesExhausted { level })
}
