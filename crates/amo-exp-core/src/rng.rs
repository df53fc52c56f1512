//! Random sources for variant sampling and seed-derivation helpers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

/// Source of uniform samples in `[0, 1)` consumed by the variant selector.
///
/// Any `FnMut() -> f64` closure is a random source, which keeps tests able to
/// pin the draw to an exact value.
pub trait RandomSource {
    /// Returns the next uniform sample in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

impl<F> RandomSource for F
where
    F: FnMut() -> f64,
{
    fn next_unit(&mut self) -> f64 {
        self()
    }
}

/// RNG handle used when assignments are made for real users.
///
/// Production callers build it from OS entropy. Replays and simulations seed
/// it from a master `u64`; per-experiment substreams are derived by hashing
/// `(master_seed, experiment_id)` with SipHash-1-3 under fixed zero keys, so
/// the same seed always buckets the same way regardless of how many other
/// experiments were evaluated first.
#[derive(Debug, Clone)]
pub struct RngHandle {
    rng: StdRng,
}

impl RngHandle {
    /// Creates a new RNG handle from a master seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates a handle seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a handle dedicated to one experiment under a master seed.
    pub fn for_experiment(master_seed: u64, experiment_id: &str) -> Self {
        Self::from_seed(derive_experiment_seed(master_seed, experiment_id))
    }
}

impl RandomSource for RngHandle {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Derives the deterministic seed for a specific experiment substream.
pub fn derive_experiment_seed(master_seed: u64, experiment_id: &str) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(master_seed);
    hasher.write(experiment_id.as_bytes());
    hasher.finish()
}
