use super::{hash::HashFamily, hash::UniversalHash, BuildConfig, Error, FixedSet, Key, Level};
use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::{format, vec, vec::Vec};
use core::num::NonZeroU32;
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn distinct_keys(rng: &mut SmallRng, n: usize) -> Vec<i64> {
    let mut seen = BTreeSet::new();
    let mut keys = Vec::with_capacity(n);
    while keys.len() < n {
        let key = i64::from(rng.gen::<i32>());
        if seen.insert(key) {
            keys.push(key);
        }
    }
    keys
}

fn sum_of_squares(set: &FixedSet<i64>) -> usize {
    set.occupancy().map(|size| size * size).sum()
}

#[test]
fn twelve_keys() {
    let mut rng = SmallRng::seed_from_u64(12);
    let set = FixedSet::with_rng((1..=12).collect::<Vec<i32>>(), &mut rng).unwrap();
    assert_eq!(set.len(), 12);
    assert!(set.contains(&3));
    assert!(!set.contains(&13));
    assert!(!set.contains(&0));
    assert!(!set.contains(&-5));
    for key in 1..=12 {
        assert!(set.contains(&key), "{key} was inserted");
    }
}

#[test]
fn empty() {
    let mut rng = SmallRng::seed_from_u64(0);
    let set: FixedSet<i64> = FixedSet::with_rng(vec![], &mut rng).unwrap();
    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
    assert_eq!(set.capacity(), 0);
    assert_eq!(set.occupancy().len(), 0);
    assert_eq!(set.iter().next(), None);
    for probe in [0, 1, -1, i64::MIN, i64::MAX] {
        assert!(!set.contains(&probe), "{probe} is not in an empty set");
    }
}

#[test]
fn singleton() {
    let mut rng = SmallRng::seed_from_u64(42);
    let set = FixedSet::with_rng(vec![42i64], &mut rng).unwrap();
    assert!(set.contains(&42));
    assert!(!set.contains(&41));
    assert_eq!(set.occupancy().collect::<Vec<_>>(), vec![1]);
    assert_eq!(set.capacity(), 1);
    assert_eq!(set.get(&42), Some(&42));
    assert_eq!(format!("{set:?}"), "{42}");
}

#[test]
fn completeness_and_no_false_positives() {
    let mut rng = SmallRng::seed_from_u64(0x243f_6a88);
    for n in [1, 2, 3, 10, 100, 1000] {
        let keys = distinct_keys(&mut rng, n);
        let set = FixedSet::with_rng(keys.clone(), &mut rng).unwrap();
        assert_eq!(set.len(), n);

        for key in &keys {
            assert!(set.contains(key), "{key} was inserted");
            assert_eq!(set.get(key), Some(key));
        }

        let stored: BTreeSet<i64> = keys.iter().copied().collect();
        let far = [
            i64::MIN,
            i64::MAX,
            -1 << 40i32,
            1 << 50i32,
            i64::from(i32::MIN) - 1,
            i64::from(i32::MAX) + 1,
        ];
        let probes = (0..2000).map(|_| i64::from(rng.gen::<i32>())).chain(far);
        for probe in probes.filter(|probe| !stored.contains(probe)) {
            assert!(!set.contains(&probe), "{probe} was not inserted");
        }
    }
}

#[test]
fn congruent_probes_are_absent() {
    let mut rng = SmallRng::seed_from_u64(7);
    let keys: BTreeSet<u64> = (0..100).map(|_| u64::from(rng.gen::<u32>())).collect();
    let set = FixedSet::with_rng(keys.iter().copied().collect(), &mut rng).unwrap();
    let p = HashFamily::default().prime();
    for key in keys {
        // Same residue, hence the same slot, but a different value
        assert!(!set.contains(&(key + p)), "{key} + p was not inserted");
        assert!(!set.contains(&(key + 2 * p)), "{key} + 2p was not inserted");
    }
}

#[test]
fn mixed_sign_keys() {
    let mut rng = SmallRng::seed_from_u64(0x5167);
    let set = FixedSet::with_rng((-1000i32..=1000).collect(), &mut rng).unwrap();
    assert_eq!(set.len(), 2001);
    for key in -1000..=1000 {
        assert!(set.contains(&key), "{key} was inserted");
    }
    for probe in [-1001, 1001, i32::MIN, i32::MAX] {
        assert!(!set.contains(&probe), "{probe} was not inserted");
    }

    let keys = vec![i64::MIN, i64::MIN + 1, -8, -1, 0, 7, 8, i64::MAX];
    let set = FixedSet::with_rng(keys.clone(), &mut rng).unwrap();
    for key in &keys {
        assert!(set.contains(key), "{key} was inserted");
    }
    for probe in [i64::MIN + 2, -9, -7, -2, 1, 6, 9, i64::MAX - 1] {
        assert!(!set.contains(&probe), "{probe} was not inserted");
    }
}

#[test]
fn space_bound() {
    let mut rng = SmallRng::seed_from_u64(4);
    for n in [1, 10, 100, 1000] {
        for _ in 0..5 {
            let set = FixedSet::with_rng(distinct_keys(&mut rng, n), &mut rng).unwrap();
            assert_eq!(set.occupancy().len(), n, "one bucket per key");
            assert_eq!(set.occupancy().sum::<usize>(), n);
            assert_eq!(set.capacity(), sum_of_squares(&set));
            assert!(set.capacity() <= 4 * n, "{} > 4 * {n}", set.capacity());
            assert_eq!(set.first_level().range(), n);
        }
    }
}

#[test]
fn second_level_collision_free() {
    let mut rng = SmallRng::seed_from_u64(5);
    let set = FixedSet::with_rng(distinct_keys(&mut rng, 1000), &mut rng).unwrap();
    for (bucket, (keys, hash)) in set.buckets().zip(set.second_level()).enumerate() {
        let keys: Vec<&i64> = keys.collect();
        assert_eq!(hash.range(), keys.len() * keys.len());
        let slots: BTreeSet<usize> = keys.iter().map(|key| hash.hash(key.project())).collect();
        assert_eq!(slots.len(), keys.len(), "collision in bucket {bucket}");
        for key in keys {
            assert_eq!(set.first_level().hash(key.project()), bucket);
        }
    }
}

#[test]
fn deterministic_under_fixed_seed() {
    let keys = distinct_keys(&mut SmallRng::seed_from_u64(1), 500);
    let a = FixedSet::with_rng(keys.clone(), &mut SmallRng::seed_from_u64(99)).unwrap();
    let b = FixedSet::with_rng(keys.clone(), &mut SmallRng::seed_from_u64(99)).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.first_level(), b.first_level());
    for probe in keys.iter().copied().chain(-1000..1000) {
        assert_eq!(a.contains(&probe), b.contains(&probe));
    }
    assert!(a.iter().eq(b.iter()), "same iteration order");
}

#[test]
fn duplicates_are_rejected() {
    let mut rng = SmallRng::seed_from_u64(3);
    let result = FixedSet::with_rng(vec![3i32, 1, 4, 1, 5], &mut rng);
    assert!(matches!(
        result,
        Err(Error::DuplicateKey {
            first: 1,
            second: 3
        })
    ));
}

#[test]
fn congruent_keys_are_rejected() {
    let mut rng = SmallRng::seed_from_u64(3);
    let p = HashFamily::default().prime();
    let result = FixedSet::with_rng(vec![10u64, 20, 10 + p], &mut rng);
    assert!(matches!(
        result,
        Err(Error::ResidueCollision {
            first: 0,
            second: 2
        })
    ));

    // The same keys are fine under a larger prime
    let family = HashFamily::new(18_446_744_073_709_551_557).unwrap();
    let config = BuildConfig::new().with_family(family);
    let set = FixedSet::with_config(vec![10u64, 20, 10 + p], &config, &mut rng).unwrap();
    assert!(set.contains(&(10 + p)));
    assert!(!set.contains(&(20 + p)));
}

#[test]
fn small_prime() {
    let mut rng = SmallRng::seed_from_u64(11);
    let family = HashFamily::new(1_000_003).unwrap();
    let config = BuildConfig::new().with_family(family);
    let keys: Vec<u32> = (0..1000).map(|i| i * 997).collect();
    let set = FixedSet::with_config(keys.clone(), &config, &mut rng).unwrap();
    assert_eq!(set.first_level().family(), family);
    for key in &keys {
        assert!(set.contains(key), "{key} was inserted");
    }
    assert!(!set.contains(&1));
    assert!(!set.contains(&(999 * 997 + 1)));
}

#[test]
fn unbounded_config() {
    let mut rng = SmallRng::seed_from_u64(8);
    let config = BuildConfig::new().unbounded();
    assert_eq!(config.max_attempts(), None);
    let set = FixedSet::with_config(distinct_keys(&mut rng, 300), &config, &mut rng).unwrap();
    assert_eq!(set.len(), 300);
}

#[test]
fn tight_attempt_cap() {
    // With one attempt per loop, some of many builds fail, and they fail with a clear error
    let config = BuildConfig::new().with_max_attempts(NonZeroU32::MIN);
    let mut rng = SmallRng::seed_from_u64(13);
    let mut failures = 0;
    for _ in 0..50 {
        match FixedSet::with_config(distinct_keys(&mut rng, 50), &config, &mut rng) {
            Ok(set) => assert_eq!(set.len(), 50),
            Err(Error::AttemptsExhausted { attempts: 1, .. }) => failures += 1,
            Err(error) => panic!("unexpected error: {error}"),
        }
    }
    assert!(failures > 0, "one attempt is not enough for 50 buckets");
}

#[test]
fn all_i8() {
    let mut rng = SmallRng::seed_from_u64(0x18);
    let keys: Vec<i8> = (i8::MIN..=i8::MAX).collect();
    let set = FixedSet::with_rng(keys, &mut rng).unwrap();
    assert_eq!(set.len(), 256);
    assert!((i8::MIN..=i8::MAX).all(|key| set.contains(&key)));
}

#[test]
fn integer_width_does_not_matter() {
    assert_eq!((-5i8).project(), (-5i64).project());
    assert_eq!(200u8.project(), 200u64.project());
    assert_eq!('a'.project(), 97u32.project());
    assert_eq!(true.project(), 1u64.project());
}

#[test]
fn strings() {
    let mut rng = SmallRng::seed_from_u64(6);
    let words: Vec<String> = ["apple", "banana", "cherry", "", "date", "elderberry"]
        .iter()
        .map(ToString::to_string)
        .collect();
    let set = FixedSet::with_rng(words, &mut rng).unwrap();
    assert!(set.contains("apple"));
    assert!(set.contains(""));
    assert!(!set.contains("fig"));
    assert_eq!(set.get("cherry").map(String::as_str), Some("cherry"));

    let bytes: FixedSet<&[u8]> = FixedSet::with_rng(vec![&b"ab"[..], b"ba"], &mut rng).unwrap();
    assert!(bytes.contains(&&b"ab"[..]));
    assert!(!bytes.contains(&&b"aa"[..]));
}

#[test]
fn iteration() {
    let mut rng = SmallRng::seed_from_u64(9);
    let keys = distinct_keys(&mut rng, 200);
    let set = FixedSet::with_rng(keys.clone(), &mut rng).unwrap();

    let iter = set.iter();
    assert_eq!(iter.len(), 200);
    let mut collected: Vec<i64> = iter.copied().collect();
    collected.sort_unstable();
    let mut expected = keys;
    expected.sort_unstable();
    assert_eq!(collected, expected);

    let by_bucket: Vec<&i64> = set.buckets().flatten().collect();
    let flat: Vec<&i64> = (&set).into_iter().collect();
    assert_eq!(by_bucket, flat, "iteration goes bucket by bucket");
}

#[cfg(feature = "std")]
#[test]
fn os_seeded() {
    let set = FixedSet::new(vec!['x', 'y', 'z']).unwrap();
    assert!(set.contains(&'y'));
    assert!(!set.contains(&'w'));
}

#[cfg(feature = "std")]
#[test]
fn concurrent_reads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FixedSet<i64>>();

    let mut rng = SmallRng::seed_from_u64(10);
    let keys = distinct_keys(&mut rng, 1000);
    let set = FixedSet::with_rng(keys.clone(), &mut rng).unwrap();
    std::thread::scope(|scope| {
        for chunk in keys.chunks(250) {
            let set = &set;
            scope.spawn(move || {
                for key in chunk {
                    assert!(set.contains(key), "{key} was inserted");
                }
            });
        }
    });
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_matches_sequential() {
    let keys = distinct_keys(&mut SmallRng::seed_from_u64(2), 5000);
    let config = BuildConfig::default();
    let sequential =
        FixedSet::with_config(keys.clone(), &config, &mut SmallRng::seed_from_u64(77)).unwrap();
    let parallel =
        FixedSet::par_with_config(keys, &config, &mut SmallRng::seed_from_u64(77)).unwrap();
    assert_eq!(sequential, parallel);
}

mod sampling {
    use super::super::sampling::rejection_sample;
    use super::*;

    /// Keys 1 and 5 under `p = 7`, `m = 4`: `a = 1` collides, `a = 2` does not.
    fn candidates() -> (UniversalHash, UniversalHash) {
        let family = HashFamily::new(7).unwrap();
        let bad = UniversalHash::new(family, 1, 0, 4).unwrap();
        let good = UniversalHash::new(family, 2, 0, 4).unwrap();
        (bad, good)
    }

    fn injective(hash: &UniversalHash) -> Option<()> {
        (hash.hash(1) != hash.hash(5)).then_some(())
    }

    #[test]
    fn accepts_first_good_candidate() {
        let (bad, good) = candidates();
        let mut checked = 0;
        let (accepted, ()) = rejection_sample(vec![bad, bad, good, bad], None, Level::Second, |hash| {
            checked += 1;
            injective(hash)
        })
        .unwrap();
        assert_eq!(accepted, good);
        assert_eq!(checked, 3);
    }

    #[test]
    fn gives_up_at_cap() {
        let (bad, good) = candidates();
        let cap = NonZeroU32::new(2);
        let result = rejection_sample(vec![bad, bad, good], cap, Level::Second, injective);
        assert!(matches!(
            result,
            Err(Error::AttemptsExhausted {
                level: Level::Second,
                attempts: 2
            })
        ));

        // The cap counts rejections, so a good candidate in the last allowed attempt still counts
        let result = rejection_sample(vec![bad, good], cap, Level::Second, injective);
        assert_eq!(result.unwrap().0, good);
    }

    #[test]
    fn runs_out_of_candidates() {
        let (bad, _) = candidates();
        let result = rejection_sample(vec![bad, bad], None, Level::First, injective);
        assert!(matches!(
            result,
            Err(Error::CandidatesExhausted { level: Level::First })
        ));
        let result = rejection_sample(Vec::new(), None, Level::First, injective);
        assert!(matches!(result, Err(Error::CandidatesExhausted { .. })));
    }

    #[test]
    fn error_messages() {
        let error = Error::AttemptsExhausted {
            level: Level::First,
            attempts: 3,
        };
        assert_eq!(
            error.to_string(),
            "no acceptable first-level hash function after 3 attempts"
        );
        assert_eq!(
            Error::DuplicateKey { first: 0, second: 4 }.to_string(),
            "keys at positions 0 and 4 are equal"
        );
    }
}

#[cfg(feature = "serde")]
mod serialization {
    use super::*;

    fn sample_set() -> FixedSet<i64> {
        let mut rng = SmallRng::seed_from_u64(21);
        FixedSet::with_rng(distinct_keys(&mut rng, 50), &mut rng).unwrap()
    }

    #[test]
    fn round_trip() {
        let set = sample_set();
        let json = serde_json::to_string(&set).unwrap();
        let restored: FixedSet<i64> = serde_json::from_str(&json).unwrap();
        assert_eq!(set, restored);
    }

    #[test]
    fn tampering_is_detected() {
        let value = serde_json::to_value(sample_set()).unwrap();

        let mut wrong_len = value.clone();
        wrong_len["len"] = serde_json::json!(51);
        assert!(serde_json::from_value::<FixedSet<i64>>(wrong_len).is_err());

        let mut zero_multiplier = value.clone();
        zero_multiplier["first"]["multiplier"] = serde_json::json!(0);
        assert!(serde_json::from_value::<FixedSet<i64>>(zero_multiplier).is_err());

        let mut composite = value.clone();
        composite["first"]["prime"] = serde_json::json!(1_984_533);
        assert!(serde_json::from_value::<FixedSet<i64>>(composite).is_err());

        let mut wrong_range = value.clone();
        wrong_range["first"]["range"] = serde_json::json!(49);
        assert!(serde_json::from_value::<FixedSet<i64>>(wrong_range).is_err());

        // Moving every key to another bucket
        let mut shifted = value.clone();
        let offset = shifted["first"]["offset"].as_u64().unwrap();
        shifted["first"]["offset"] = serde_json::json!(offset ^ 1);
        assert!(serde_json::from_value::<FixedSet<i64>>(shifted).is_err());

        assert!(serde_json::from_value::<FixedSet<i64>>(value).is_ok());
    }

    #[test]
    fn family_is_a_bare_prime() {
        let family = HashFamily::new(1_000_003).unwrap();
        assert_eq!(serde_json::to_string(&family).unwrap(), "1000003");
        assert_eq!(serde_json::from_str::<HashFamily>("1000003").unwrap(), family);
        assert!(serde_json::from_str::<HashFamily>("1984533").is_err());
    }
}
