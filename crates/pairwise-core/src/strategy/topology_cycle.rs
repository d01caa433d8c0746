//! Hierarchical-Cycle: shuffle inside one topology group per block of draws

use super::{DrawContext, PairMode, PairStrategy, RandomizedShuffle, SessionState};
use crate::errors::{PairingError, Result};
use crate::features::{exact_label_pattern, Label};
use crate::range::RangeFilterMode;
use crate::types::{Assignment, Slot};

/// Draws per topology group before moving to the next one
pub const DEFAULT_BLOCK_SIZE: usize = 10;

/// Cycle through the topology groups of the original feature map.
///
/// Before each block of draws the range is restored to the original range and
/// narrowed to the holders of the block's group label. Every block starts at
/// a stream checkpoint, so participants idling a block (because they do not
/// hold its label) stay in step with those drawing in it.
#[derive(Debug, Clone)]
pub struct TopologyCycle {
    shuffle: RandomizedShuffle,
    block_size: usize,
    prefix: String,
}

impl TopologyCycle {
    pub fn new(block_size: usize, prefix: impl Into<String>) -> Self {
        Self {
            shuffle: RandomizedShuffle::new(),
            block_size: block_size.max(1),
            prefix: prefix.into(),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Group label scheduled for block `block`
    pub fn group_for_block(groups: &[Label], block: usize) -> Option<&Label> {
        if groups.is_empty() {
            None
        } else {
            groups.get(block % groups.len())
        }
    }

    fn run_block(
        &mut self,
        state: &mut SessionState,
        group: &str,
        draws: std::ops::Range<usize>,
        out: &mut Vec<Assignment>,
    ) -> Result<()> {
        state.seed.checkpoint();
        state.range.restore_original();
        state.features.refilter(Some(&exact_label_pattern(group)))?;

        let holds_group = state
            .features
            .labels_of(state.self_id)
            .iter()
            .any(|label| label == group);
        if holds_group {
            state
                .range
                .apply_label_filter(RangeFilterMode::Include, &state.features);
        }
        state.range.normalize();

        if !holds_group || !state.range.contains_self() {
            tracing::debug!(participant = %state.self_id, %group, "Idle for topology block");
            out.extend(draws.map(|_| Assignment(Slot::from(state.self_id), Slot::NoPartner)));
            return Ok(());
        }

        tracing::debug!(
            participant = %state.self_id,
            %group,
            range = ?state.range.as_slice(),
            "Drawing topology block"
        );
        let mut candidates = state.range.as_slice().to_vec();
        let mut ctx = state.draw_context();
        for iteration in draws {
            out.push(self.shuffle.next(&mut ctx, &mut candidates, iteration));
        }
        Ok(())
    }
}

impl PairStrategy for TopologyCycle {
    fn mode(&self) -> PairMode {
        PairMode::TopologyCycle
    }

    fn next(
        &mut self,
        ctx: &mut DrawContext<'_>,
        candidates: &mut [Slot],
        iteration: usize,
    ) -> Assignment {
        self.shuffle.next(ctx, candidates, iteration)
    }

    fn generate(&mut self, state: &mut SessionState, count: usize) -> Result<Vec<Assignment>> {
        let groups = state
            .features
            .original()
            .ok_or(PairingError::MissingFeatureMap)?
            .group_labels(&self.prefix);
        tracing::debug!(participant = %state.self_id, ?groups, "Topology groups");

        if groups.is_empty() {
            tracing::warn!(
                participant = %state.self_id,
                prefix = %self.prefix,
                "No topology-group labels; falling back to a plain shuffle"
            );
            let mut candidates = state.range.as_slice().to_vec();
            let mut ctx = state.draw_context();
            return Ok((0..count)
                .map(|iteration| self.shuffle.next(&mut ctx, &mut candidates, iteration))
                .collect());
        }

        let saved_range = state.range.as_slice().to_vec();
        let saved_features = state.features.clone();

        let mut out = Vec::with_capacity(count);
        for (block, start) in (0..count).step_by(self.block_size).enumerate() {
            let end = (start + self.block_size).min(count);
            if let Some(group) = Self::group_for_block(&groups, block) {
                self.run_block(state, group, start..end, &mut out)?;
            }
        }

        state.features = saved_features;
        state.range.replace(saved_range);
        Ok(out)
    }
}
