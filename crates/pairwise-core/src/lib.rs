//! # Pairwise Core - Message-Free Pair Assignment
//!
//! Decides which pairs of participants of a distributed run exchange data in
//! each benchmarking round. Every participant computes its own assignment
//! list independently; agreement comes only from a shared seed and a feature
//! map distributed once at startup.
//!
//! ## Components
//!
//! - [`features`]: participant labels, their reverse index and placement labels
//! - [`range`]: the candidate range, its parity normalization and label filters
//! - [`strategy`]: Sequential-Shift, Randomized-Shuffle, Feature-Exclusive-Match
//!   and Hierarchical-Cycle pairing
//! - [`session`]: the per-participant entry point
//! - [`consistency`]: offline agreement checks across all participants
//!
//! ## Coordination Contract
//!
//! The engine performs no I/O. The surrounding benchmark loop broadcasts the
//! seed before sessions are built, gathers the feature map once, and places a
//! barrier after all participants computed their assignments and before any
//! data is exchanged.

#![forbid(unsafe_code)]
#![deny(clippy::dbg_macro)]
#![deny(clippy::todo)]
#![allow(missing_docs)]

pub mod config;
pub mod consistency;
pub mod errors;
pub mod features;
pub mod prelude;
pub mod range;
pub mod seed;
pub mod session;
pub mod strategy;
pub mod types;

pub use config::{GroupMode, PairingConfig};
pub use consistency::{pair_coverage, verify_consistency, ConsistencyReport, Mismatch};
pub use errors::{PairingError, Result};
pub use features::{grid_placements, FeatureIndex, FeatureMap, Label, Placement, ReverseIndex};
pub use range::{RangeFilter, RangeFilterMode, RangeSource};
pub use seed::SeedState;
pub use session::{default_sample_count, AssignmentSession};
pub use strategy::{
    build_strategy, strategy_by_name, DrawContext, GroupExclusiveMatch, PairMode, PairStrategy,
    RandomizedShuffle, SequentialShift, SessionState, StrategyOptions, TopologyCycle,
};
pub use types::{Assignment, ParticipantId, Slot};
