//! Pairwise prelude.
//!
//! Curated re-exports for benchmark loops driving an assignment session.

pub use crate::{
    Assignment, AssignmentSession, FeatureMap, PairMode, PairingConfig, PairingError,
    ParticipantId, RangeFilterMode, Slot,
};
