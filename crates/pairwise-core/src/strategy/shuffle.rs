//! Randomized-Shuffle: one shared shuffle per draw

use super::{duple_containing, DrawContext, PairMode, PairStrategy};
use crate::types::{Assignment, Slot};

/// Shuffle the whole range with the shared stream and pair neighbours.
///
/// Each participant performs exactly one shuffle per draw over an identical
/// range, so all of them compute the same global pairing and each keeps the
/// duple holding itself. The shuffled order carries over to the next draw.
#[derive(Debug, Clone, Default)]
pub struct RandomizedShuffle;

impl RandomizedShuffle {
    pub fn new() -> Self {
        Self
    }
}

impl PairStrategy for RandomizedShuffle {
    fn mode(&self) -> PairMode {
        PairMode::Shuffle
    }

    fn next(
        &mut self,
        ctx: &mut DrawContext<'_>,
        candidates: &mut [Slot],
        _iteration: usize,
    ) -> Assignment {
        ctx.seed.shuffle(candidates);
        duple_containing(candidates, ctx.self_id, self.mode())
    }
}
