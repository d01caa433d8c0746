//! Candidate range and label-based range filters

use crate::errors::PairingError;
use crate::features::FeatureIndex;
use crate::types::{ParticipantId, Slot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Source of a candidate range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSource {
    /// Every id below the bound
    Bound(u32),
    /// An explicit ordered id list
    List(Vec<Slot>),
}

impl From<u32> for RangeSource {
    fn from(bound: u32) -> Self {
        RangeSource::Bound(bound)
    }
}

impl From<Vec<Slot>> for RangeSource {
    fn from(list: Vec<Slot>) -> Self {
        RangeSource::List(list)
    }
}

impl From<Vec<ParticipantId>> for RangeSource {
    fn from(list: Vec<ParticipantId>) -> Self {
        RangeSource::List(list.into_iter().map(Slot::from).collect())
    }
}

/// How the feature map narrows the range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RangeFilterMode {
    /// Keep only participants sharing a label with self
    Include,
    /// Drop participants sharing a label with self, keeping self
    Exclude,
    /// Leave the range alone; exclusivity is enforced while pairing
    GroupExclude,
}

impl RangeFilterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RangeFilterMode::Include => "include",
            RangeFilterMode::Exclude => "exclude",
            RangeFilterMode::GroupExclude => "group-exclude",
        }
    }
}

impl FromStr for RangeFilterMode {
    type Err = PairingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "include" | "incl" => Ok(RangeFilterMode::Include),
            "exclude" | "excl" => Ok(RangeFilterMode::Exclude),
            "group-exclude" | "groupexcl" => Ok(RangeFilterMode::GroupExclude),
            other => Err(PairingError::UnknownRangeFilter(other.to_string())),
        }
    }
}

impl TryFrom<String> for RangeFilterMode {
    type Error = PairingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RangeFilterMode> for String {
    fn from(mode: RangeFilterMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for RangeFilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Working candidate pool of one participant
#[derive(Debug, Clone)]
pub struct RangeFilter {
    self_id: ParticipantId,
    range: Vec<Slot>,
    original: Option<Vec<Slot>>,
}

impl RangeFilter {
    pub fn new(self_id: ParticipantId) -> Self {
        Self {
            self_id,
            range: Vec::new(),
            original: None,
        }
    }

    /// Replace the range, keeping every `step`th entry from `start`.
    ///
    /// The first non-empty range ever produced is remembered as the original
    /// range for [`RangeFilter::restore_original`].
    pub fn set_range(&mut self, source: impl Into<RangeSource>, start: usize, step: usize) {
        let step = step.max(1);
        self.range = match source.into() {
            RangeSource::Bound(bound) => (start..bound as usize)
                .step_by(step)
                .filter_map(|id| u32::try_from(id).ok())
                .map(|id| Slot::from(ParticipantId::new(id)))
                .collect(),
            RangeSource::List(list) => list.into_iter().skip(start).step_by(step).collect(),
        };

        if self.original.as_ref().map_or(true, Vec::is_empty) {
            self.original = Some(self.range.clone());
        }
        tracing::debug!(
            participant = %self.self_id,
            size = self.range.len(),
            range = ?self.range,
            "Range set"
        );
    }

    /// Go back to the first range ever set
    pub fn restore_original(&mut self) {
        self.range = self.original.clone().unwrap_or_default();
    }

    /// Swap in a previously captured range without touching the original
    pub fn replace(&mut self, range: Vec<Slot>) {
        self.range = range;
    }

    /// Make the range even and non-empty.
    ///
    /// An empty range, or one holding only self, becomes `[self, NoPartner]`;
    /// any other odd range gets a trailing `Padding`.
    pub fn normalize(&mut self) {
        let me = Slot::from(self.self_id);
        if self.range.is_empty() || self.range == [me] {
            self.range = vec![me, Slot::NoPartner];
            tracing::info!(
                participant = %self.self_id,
                "No possible partner in range; pairing self with no partner"
            );
        } else if self.range.len() % 2 == 1 {
            self.range.push(Slot::Padding);
            tracing::info!(
                participant = %self.self_id,
                size = self.range.len(),
                "Odd range; appended padding"
            );
        }
    }

    /// Narrow the range with the labels attached to self
    pub fn apply_label_filter(&mut self, mode: RangeFilterMode, features: &FeatureIndex) {
        if mode == RangeFilterMode::GroupExclude {
            tracing::debug!(participant = %self.self_id, "Group exclusion is applied while pairing");
            return;
        }

        let me = Slot::from(self.self_id);
        let labels = features.labels_of(self.self_id);
        if labels.is_empty() {
            tracing::warn!(
                participant = %self.self_id,
                filter = %mode,
                "No labels recorded for self; keeping current range"
            );
            return;
        }

        let sharing: BTreeSet<Slot> = features.sharing_with(me, |slot| self.range.contains(&slot));
        tracing::debug!(participant = %self.self_id, ?labels, ?sharing, "Label filter");

        match mode {
            RangeFilterMode::Include => {
                self.set_range(sharing.into_iter().collect::<Vec<_>>(), 0, 1);
            }
            RangeFilterMode::Exclude => {
                tracing::warn!(
                    participant = %self.self_id,
                    "Exclude filter keeps self and does not mirror include"
                );
                let mut kept: Vec<Slot> = self
                    .range
                    .iter()
                    .copied()
                    .filter(|slot| !sharing.contains(slot))
                    .collect();
                if !kept.contains(&me) {
                    kept.push(me);
                }
                kept.sort();
                self.set_range(kept, 0, 1);
            }
            RangeFilterMode::GroupExclude => {}
        }
    }

    pub fn self_id(&self) -> ParticipantId {
        self.self_id
    }

    pub fn as_slice(&self) -> &[Slot] {
        &self.range
    }

    pub fn original(&self) -> Option<&[Slot]> {
        self.original.as_deref()
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn contains_self(&self) -> bool {
        self.range.contains(&Slot::from(self.self_id))
    }
}
