//! Per-participant assignment session
//!
//! One session lives in each participant process. It owns the seed state,
//! the feature index, the candidate range and the active strategy, and turns
//! them into the ordered assignment list the benchmarking loop drives its
//! communication rounds from.

use crate::config::PairingConfig;
use crate::errors::Result;
use crate::features::{FeatureIndex, FeatureMap};
use crate::range::{RangeFilter, RangeFilterMode, RangeSource};
use crate::seed::SeedState;
use crate::strategy::{build_strategy, PairMode, PairStrategy, SessionState, StrategyOptions};
use crate::types::{Assignment, ParticipantId, Slot};

/// Draw count used when none is configured: one more than half the range
pub fn default_sample_count(range_len: usize) -> usize {
    range_len / 2 + 1
}

#[derive(Debug)]
pub struct AssignmentSession {
    state: SessionState,
    strategy: Box<dyn PairStrategy>,
    samples: Option<usize>,
}

impl AssignmentSession {
    /// Session over `0..range_size` using the shuffle strategy
    pub fn new(seed: u64, range_size: u32, self_id: ParticipantId) -> Self {
        let mut state = SessionState::new(seed, self_id);
        state.range.set_range(range_size, 0, 1);
        tracing::debug!(participant = %self_id, seed, range_size, "Assignment session created");
        Self {
            state,
            strategy: build_strategy(PairMode::default(), &StrategyOptions::default()),
            samples: None,
        }
    }

    /// Session configured from `config`.
    ///
    /// The feature map, when given, is installed with the configured label
    /// filter and the configured range filter is applied right after.
    pub fn from_config(
        config: &PairingConfig,
        self_id: ParticipantId,
        feature_map: Option<FeatureMap>,
    ) -> Result<Self> {
        config.validate()?;
        let mut session = Self::new(config.seed, config.participants, self_id)
            .with_strategy(build_strategy(config.effective_mode(), &config.strategy_options()));
        session.samples = config.samples;

        if let Some(map) = feature_map {
            session.set_feature_map(Some(map), config.label_filter.as_deref())?;
            if let Some(filter) = config.effective_range_filter() {
                session.apply_range_filter(filter);
            }
        } else if config.effective_range_filter().is_some() {
            tracing::warn!(participant = %self_id, "Range filter configured without a feature map");
        }
        Ok(session)
    }

    pub fn with_strategy(mut self, strategy: Box<dyn PairStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn set_strategy(&mut self, strategy: Box<dyn PairStrategy>) {
        self.strategy = strategy;
    }

    pub fn set_range(&mut self, source: impl Into<RangeSource>, start: usize, step: usize) {
        self.state.range.set_range(source, start, step);
    }

    /// Install (or with `None`, re-derive) the feature map
    pub fn set_feature_map(
        &mut self,
        raw: Option<FeatureMap>,
        label_filter: Option<&str>,
    ) -> Result<()> {
        self.state.features.set_feature_map(raw, label_filter)
    }

    pub fn apply_range_filter(&mut self, mode: RangeFilterMode) {
        self.state
            .range
            .apply_label_filter(mode, &self.state.features);
    }

    pub fn set_samples(&mut self, samples: Option<usize>) {
        self.samples = samples;
    }

    /// Configured draw count, or the default for the original range.
    ///
    /// The default ignores label filters so every participant of a run
    /// draws the same number of times.
    pub fn samples(&self) -> usize {
        self.samples.unwrap_or_else(|| {
            let len = self
                .state
                .range
                .original()
                .map_or(self.state.range.len(), <[_]>::len);
            default_sample_count(len)
        })
    }

    /// Produce exactly `count` assignments for this participant.
    ///
    /// A participant missing from its own (filtered) range is outside this
    /// run's pairing space and receives `count` unassigned pairs without the
    /// strategy being consulted. A participant alone in its range receives
    /// `count` pairs of `(self, NoPartner)`.
    pub fn generate_assignments(&mut self, count: usize) -> Result<Vec<Assignment>> {
        self.samples = Some(count);
        self.state.range.normalize();

        if !self.state.range.contains_self() {
            tracing::debug!(participant = %self.state.self_id, "Self not in range; no pairs");
            return Ok(vec![Assignment::UNASSIGNED; count]);
        }

        let me = Slot::from(self.state.self_id);
        if self.state.range.as_slice() == [me, Slot::NoPartner] {
            tracing::debug!(participant = %self.state.self_id, "Alone in range; no partner");
            return Ok(vec![Assignment(me, Slot::NoPartner); count]);
        }

        let assignments = self.strategy.generate(&mut self.state, count)?;
        tracing::debug!(
            participant = %self.state.self_id,
            mode = %self.strategy.mode(),
            count = assignments.len(),
            "Generated assignments"
        );
        Ok(assignments)
    }

    /// Generate with the configured (or default) draw count
    pub fn generate(&mut self) -> Result<Vec<Assignment>> {
        let count = self.samples();
        self.generate_assignments(count)
    }

    pub fn self_id(&self) -> ParticipantId {
        self.state.self_id
    }

    pub fn mode(&self) -> PairMode {
        self.strategy.mode()
    }

    pub fn seed(&self) -> &SeedState {
        &self.state.seed
    }

    pub fn range(&self) -> &RangeFilter {
        &self.state.range
    }

    pub fn features(&self) -> &FeatureIndex {
        &self.state.features
    }
}
