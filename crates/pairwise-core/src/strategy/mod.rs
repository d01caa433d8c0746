//! Pair strategies
//!
//! A strategy turns the candidate range and a draw counter into the duple that
//! contains self. Every participant runs the same strategy over the same range
//! with an identically seeded stream, so each computes its own slice of one
//! globally consistent pairing without exchanging messages.
//!
//! | mode | behaviour |
//! |---|---|
//! | `shift` | rotate the range by the draw counter, pair neighbours |
//! | `shuffle` | shuffle the range with the shared stream, pair neighbours |
//! | `group-exclusive` | never pair participants that share a label |
//! | `topology-cycle` | shuffle within one topology group per block of draws |

mod group_exclusive;
mod shift;
mod shuffle;
mod topology_cycle;

pub use group_exclusive::GroupExclusiveMatch;
pub use shift::SequentialShift;
pub use shuffle::RandomizedShuffle;
pub use topology_cycle::{TopologyCycle, DEFAULT_BLOCK_SIZE};

use crate::errors::{PairingError, Result};
use crate::features::{FeatureIndex, DEFAULT_TOPOLOGY_PREFIX};
use crate::range::RangeFilter;
use crate::seed::SeedState;
use crate::types::{Assignment, ParticipantId, Slot};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of a pair strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PairMode {
    Shift,
    #[default]
    Shuffle,
    GroupExclusive,
    TopologyCycle,
}

impl PairMode {
    pub const ALL: [PairMode; 4] = [
        PairMode::Shift,
        PairMode::Shuffle,
        PairMode::GroupExclusive,
        PairMode::TopologyCycle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PairMode::Shift => "shift",
            PairMode::Shuffle => "shuffle",
            PairMode::GroupExclusive => "group-exclusive",
            PairMode::TopologyCycle => "topology-cycle",
        }
    }
}

impl FromStr for PairMode {
    type Err = PairingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "shift" => Ok(PairMode::Shift),
            "shuffle" => Ok(PairMode::Shuffle),
            "group-exclusive" | "groupexcl" => Ok(PairMode::GroupExclusive),
            "topology-cycle" | "hwloc" => Ok(PairMode::TopologyCycle),
            other => Err(PairingError::UnknownPairMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for PairMode {
    type Error = PairingError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PairMode> for String {
    fn from(mode: PairMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for PairMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunables shared by the strategy constructors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyOptions {
    /// Extra rotation applied by [`SequentialShift`]
    pub shift_offset: usize,
    /// Draws per topology group in [`TopologyCycle`]
    pub block_size: usize,
    /// Prefix identifying topology-group labels
    pub topology_prefix: String,
}

impl Default for StrategyOptions {
    fn default() -> Self {
        Self {
            shift_offset: 0,
            block_size: DEFAULT_BLOCK_SIZE,
            topology_prefix: DEFAULT_TOPOLOGY_PREFIX.to_string(),
        }
    }
}

/// Everything a single draw may read or advance
pub struct DrawContext<'a> {
    pub self_id: ParticipantId,
    pub seed: &'a mut SeedState,
    pub features: &'a FeatureIndex,
}

/// Per-participant state a strategy generates assignments from
#[derive(Debug, Clone)]
pub struct SessionState {
    pub self_id: ParticipantId,
    pub seed: SeedState,
    pub features: FeatureIndex,
    pub range: RangeFilter,
}

impl SessionState {
    pub fn new(seed: u64, self_id: ParticipantId) -> Self {
        Self {
            self_id,
            seed: SeedState::new(seed),
            features: FeatureIndex::new(),
            range: RangeFilter::new(self_id),
        }
    }

    pub fn draw_context(&mut self) -> DrawContext<'_> {
        DrawContext {
            self_id: self.self_id,
            seed: &mut self.seed,
            features: &self.features,
        }
    }
}

/// One member of the pair strategy family
pub trait PairStrategy: fmt::Debug + Send {
    fn mode(&self) -> PairMode;

    /// Produce the duple containing self for draw `iteration`.
    ///
    /// `candidates` is even and non-empty. Strategies may reorder it; the
    /// reordered slice is what the next draw sees.
    fn next(
        &mut self,
        ctx: &mut DrawContext<'_>,
        candidates: &mut [Slot],
        iteration: usize,
    ) -> Assignment;

    /// Produce `count` draws from a normalized range that contains self
    fn generate(&mut self, state: &mut SessionState, count: usize) -> Result<Vec<Assignment>> {
        let mut candidates = state.range.as_slice().to_vec();
        let mut ctx = state.draw_context();
        Ok((0..count)
            .map(|iteration| self.next(&mut ctx, &mut candidates, iteration))
            .collect())
    }
}

/// Construct the strategy registered under `mode`
pub fn build_strategy(mode: PairMode, options: &StrategyOptions) -> Box<dyn PairStrategy> {
    match mode {
        PairMode::Shift => Box::new(SequentialShift::new(options.shift_offset)),
        PairMode::Shuffle => Box::new(RandomizedShuffle::new()),
        PairMode::GroupExclusive => Box::new(GroupExclusiveMatch::new()),
        PairMode::TopologyCycle => Box::new(TopologyCycle::new(
            options.block_size,
            options.topology_prefix.clone(),
        )),
    }
}

/// Construct a strategy from its name, failing on unknown names
pub fn strategy_by_name(name: &str, options: &StrategyOptions) -> Result<Box<dyn PairStrategy>> {
    Ok(build_strategy(name.parse()?, options))
}

/// The adjacent duple of `candidates` that holds `me`.
///
/// A well-formed range always holds self; a miss is a defect and yields the
/// unassigned pair so the run can go on.
pub(crate) fn duple_containing(candidates: &[Slot], me: ParticipantId, mode: PairMode) -> Assignment {
    let me = Slot::from(me);
    match candidates
        .chunks_exact(2)
        .find(|duple| duple.contains(&me))
    {
        Some(duple) => Assignment(duple[0], duple[1]),
        None => {
            tracing::error!(
                participant = %me,
                %mode,
                candidates = ?candidates,
                "Failed to locate self in any duple"
            );
            Assignment::UNASSIGNED
        }
    }
}
