//! Feature-Exclusive-Match: pairs never share a label
//!
//! Draws repeatedly pick a random "lucky" participant and a random partner
//! among those sharing no label with it, until self has been picked. How many
//! rounds that takes differs per participant, so every call starts from the
//! same checkpoint seed; without it the participants' streams would drift
//! apart after the first call.

use super::{DrawContext, PairMode, PairStrategy};
use crate::types::{Assignment, Slot};

#[derive(Debug, Clone, Default)]
pub struct GroupExclusiveMatch;

impl GroupExclusiveMatch {
    pub fn new() -> Self {
        Self
    }
}

impl PairStrategy for GroupExclusiveMatch {
    fn mode(&self) -> PairMode {
        PairMode::GroupExclusive
    }

    fn next(
        &mut self,
        ctx: &mut DrawContext<'_>,
        candidates: &mut [Slot],
        iteration: usize,
    ) -> Assignment {
        ctx.seed.checkpoint();

        let me = Slot::from(ctx.self_id);
        let mut pool = candidates.to_vec();
        while !pool.is_empty() {
            ctx.seed.shuffle(&mut pool);
            let lucky = pool[0];

            let sharing = ctx.features.sharing_with(lucky, |slot| pool.contains(&slot));
            let mut others: Vec<Slot> = pool
                .iter()
                .copied()
                .filter(|slot| *slot != lucky && !sharing.contains(slot))
                .collect();
            others.sort();

            let other = if others.is_empty() {
                Slot::NoPartner
            } else {
                ctx.seed.shuffle(&mut others);
                others[0]
            };
            tracing::debug!(
                participant = %ctx.self_id,
                iteration,
                %lucky,
                %other,
                "Drew exclusive pair"
            );

            if lucky == me || other == me {
                return Assignment(lucky, other);
            }
            pool.retain(|slot| *slot != lucky && *slot != other);
        }

        tracing::error!(
            participant = %ctx.self_id,
            iteration,
            candidates = ?candidates,
            "Exhausted candidates without drawing self"
        );
        Assignment::UNASSIGNED
    }
}
