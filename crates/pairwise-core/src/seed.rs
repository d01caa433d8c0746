//! Shared random stream
//!
//! Every participant owns an identically seeded stream. Participants agree on
//! random outcomes only as long as they perform the same sequence of draws, so
//! strategies whose draw count depends on the participant call
//! [`SeedState::checkpoint`] to move every participant onto the same fresh
//! stream at a known boundary.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Upper bound (inclusive) of the derived checkpoint seed
pub const NEXT_SEED_CEILING: u64 = 10_000_000;

/// Seed, derived checkpoint seed and the stream they drive
#[derive(Debug, Clone)]
pub struct SeedState {
    seed: u64,
    next_seed: u64,
    rng: ChaCha20Rng,
}

impl SeedState {
    /// Seed the stream and derive the checkpoint seed from its first draw
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let next_seed = rng.gen_range(1..=NEXT_SEED_CEILING);
        tracing::debug!(seed, next_seed, "Seeded pair stream");
        Self {
            seed,
            next_seed,
            rng,
        }
    }

    /// Restart the stream from `seed`, deriving a new checkpoint seed
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Restart the stream from the precomputed checkpoint seed.
    ///
    /// The checkpoint seed only depends on the seed chain, never on how many
    /// draws happened since the last reseed.
    pub fn checkpoint(&mut self) {
        self.reseed(self.next_seed);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_seed(&self) -> u64 {
        self.next_seed
    }

    /// Uniform in-place shuffle driven by the shared stream
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    pub fn rng(&mut self) -> &mut ChaCha20Rng {
        &mut self.rng
    }
}
