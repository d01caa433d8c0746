//! Sequential-Shift: a reproducible, stream-free baseline

use super::{DrawContext, PairMode, PairStrategy};
use crate::types::{Assignment, Slot};

/// Rotate the range by `offset + iteration` and pair neighbours.
///
/// The rotation is never materialized: self's rotated position and the
/// position of its neighbour are computed directly.
#[derive(Debug, Clone, Default)]
pub struct SequentialShift {
    offset: usize,
    /// Position of self in the last range seen
    cached_position: Option<usize>,
}

impl SequentialShift {
    pub fn new(offset: usize) -> Self {
        Self {
            offset,
            cached_position: None,
        }
    }

    fn position_of(&mut self, candidates: &[Slot], me: Slot) -> Option<usize> {
        if let Some(pos) = self.cached_position {
            if candidates.get(pos) == Some(&me) {
                return Some(pos);
            }
        }
        let pos = candidates.iter().position(|slot| *slot == me)?;
        self.cached_position = Some(pos);
        Some(pos)
    }
}

impl PairStrategy for SequentialShift {
    fn mode(&self) -> PairMode {
        PairMode::Shift
    }

    fn next(
        &mut self,
        ctx: &mut DrawContext<'_>,
        candidates: &mut [Slot],
        iteration: usize,
    ) -> Assignment {
        let me = Slot::from(ctx.self_id);
        let len = candidates.len();
        let Some(pos) = self.position_of(candidates, me) else {
            return super::duple_containing(candidates, ctx.self_id, self.mode());
        };

        // rolled[i] == candidates[(i - shift) mod len]
        let shift = (self.offset % len + iteration % len) % len;
        let rolled = (pos + shift) % len;
        let mate = rolled ^ 1;
        let partner = candidates[(mate + len - shift) % len];

        if rolled % 2 == 0 {
            Assignment(me, partner)
        } else {
            Assignment(partner, me)
        }
    }
}
