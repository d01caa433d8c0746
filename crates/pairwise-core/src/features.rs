//! Feature map and reverse index
//!
//! The topology layer distributes one [`FeatureMap`] per run. The first map
//! handed to a [`FeatureIndex`] is kept as the immutable snapshot; the working
//! copy (optionally narrowed by a label pattern) and the label to participant
//! [`ReverseIndex`] are always re-derived from it and never edited in place.

use crate::errors::{PairingError, Result};
use crate::types::{ParticipantId, Slot};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

/// A topology or locality attribute attached to a participant
pub type Label = String;

/// Default reserved prefix of topology-group labels
pub const DEFAULT_TOPOLOGY_PREFIX: &str = "hwloc";

/// Participant to labels mapping as gathered by the topology layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureMap {
    entries: BTreeMap<ParticipantId, Vec<Label>>,
}

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the labels of `id`, replacing any previous entry
    pub fn insert<I, L>(&mut self, id: ParticipantId, labels: I)
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        self.entries
            .insert(id, labels.into_iter().map(Into::into).collect());
    }

    pub fn labels(&self, id: ParticipantId) -> Option<&[Label]> {
        self.entries.get(&id).map(Vec::as_slice)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, ParticipantId, Vec<Label>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the map keeping, per participant, only labels matching `pattern`
    pub fn filtered(&self, pattern: &Regex) -> FeatureMap {
        let entries = self
            .entries
            .iter()
            .map(|(id, labels)| {
                let kept = labels
                    .iter()
                    .filter(|label| pattern.is_match(label))
                    .cloned()
                    .collect();
                (*id, kept)
            })
            .collect();
        FeatureMap { entries }
    }

    /// Sorted distinct labels starting with `prefix`
    pub fn group_labels(&self, prefix: &str) -> Vec<Label> {
        self.entries
            .values()
            .flatten()
            .filter(|label| label.starts_with(prefix))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Build the labels the topology layer publishes for each placement
    pub fn from_placements<'a, I>(placements: I, topology_prefix: &str) -> Self
    where
        I: IntoIterator<Item = (ParticipantId, &'a Placement)>,
    {
        placements
            .into_iter()
            .map(|(id, placement)| (id, placement.labels(topology_prefix)))
            .collect()
    }
}

impl FromIterator<(ParticipantId, Vec<Label>)> for FeatureMap {
    fn from_iter<T: IntoIterator<Item = (ParticipantId, Vec<Label>)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Where a participant runs: host, pinned core and topology description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub host: String,
    pub core: u32,
    /// Topology description of the core; `None` when discovery failed
    pub topology: Option<String>,
}

impl Placement {
    pub fn new(host: impl Into<String>, core: u32, topology: Option<String>) -> Self {
        Self {
            host: host.into(),
            core,
            topology,
        }
    }

    /// `host`, `core_<core>` and `<prefix>_<topology>`, in that order
    pub fn labels(&self, topology_prefix: &str) -> Vec<Label> {
        let topology = self.topology.as_deref().unwrap_or("None");
        vec![
            self.host.clone(),
            format!("core_{}", self.core),
            format!("{topology_prefix}_{topology}"),
        ]
    }
}

/// Synthetic layout of `nodes` hosts running `slots_per_node` participants each.
///
/// Participants are numbered node by node. Slot `s` of every node is pinned to
/// core `s` and shares the topology description `slot <s>` with the same slot
/// on the other nodes.
pub fn grid_placements(nodes: u32, slots_per_node: u32) -> Vec<(ParticipantId, Placement)> {
    (0..nodes)
        .flat_map(|node| {
            (0..slots_per_node).map(move |slot| {
                let id = ParticipantId::new(node * slots_per_node + slot);
                let placement =
                    Placement::new(format!("node{node:03}"), slot, Some(format!("slot {slot}")));
                (id, placement)
            })
        })
        .collect()
}

/// Label to participants lookup derived from a [`FeatureMap`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseIndex {
    entries: BTreeMap<Label, Vec<ParticipantId>>,
}

impl ReverseIndex {
    /// Invert `map`. A participant listed twice under one label indicates a
    /// malformed map; the repeat is logged and skipped.
    ///
    /// Participants are visited in id order, so a repeat can only be the last
    /// holder of its label.
    pub fn build(map: &FeatureMap) -> Self {
        let mut entries: BTreeMap<Label, Vec<ParticipantId>> = BTreeMap::new();
        for (id, labels) in map.iter() {
            for label in labels {
                let holders = entries.entry(label.clone()).or_default();
                if holders.last() == Some(id) {
                    tracing::error!(
                        participant = %id,
                        label = %label,
                        "Participant already indexed under label; skipping duplicate"
                    );
                    continue;
                }
                holders.push(*id);
            }
        }
        tracing::debug!(labels = entries.len(), "Rebuilt reverse index");
        Self { entries }
    }

    pub fn holders(&self, label: &str) -> &[ParticipantId] {
        self.entries.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Snapshot, working copy and reverse index owned by one session
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    snapshot: Option<FeatureMap>,
    working: FeatureMap,
    reverse: ReverseIndex,
    pattern: Option<String>,
}

impl FeatureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a feature map, or re-derive from the snapshot when `raw` is `None`.
    ///
    /// The first map ever provided becomes the snapshot. A non-empty
    /// `label_filter` keeps only matching labels in the working copy; a
    /// pattern that does not compile is fatal.
    pub fn set_feature_map(
        &mut self,
        raw: Option<FeatureMap>,
        label_filter: Option<&str>,
    ) -> Result<()> {
        let pattern = match label_filter.filter(|p| !p.is_empty()) {
            Some(pattern) => Some(compile_label_pattern(pattern)?),
            None => None,
        };

        let source = match raw {
            Some(raw) => {
                if self.snapshot.is_none() {
                    self.snapshot = Some(raw.clone());
                }
                raw
            }
            None => self
                .snapshot
                .clone()
                .ok_or(PairingError::MissingFeatureMap)?,
        };

        self.working = match &pattern {
            Some(regex) => source.filtered(regex),
            None => source,
        };
        self.pattern = pattern.map(|regex| regex.as_str().to_string());
        self.reverse = ReverseIndex::build(&self.working);
        Ok(())
    }

    /// Re-derive the working copy from the snapshot with a new pattern
    pub fn refilter(&mut self, label_filter: Option<&str>) -> Result<()> {
        self.set_feature_map(None, label_filter)
    }

    /// The unfiltered map as first received
    pub fn original(&self) -> Option<&FeatureMap> {
        self.snapshot.as_ref()
    }

    pub fn working(&self) -> &FeatureMap {
        &self.working
    }

    pub fn reverse(&self) -> &ReverseIndex {
        &self.reverse
    }

    /// Pattern the working copy was last derived with
    pub fn label_filter(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn has_map(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Working labels of `id`; empty when the map has no entry for it
    pub fn labels_of(&self, id: ParticipantId) -> &[Label] {
        match self.working.labels(id) {
            Some(labels) => labels,
            None => {
                if self.has_map() {
                    tracing::debug!(participant = %id, "No features recorded for participant");
                }
                &[]
            }
        }
    }

    /// Participants sharing at least one working label with `slot` and
    /// accepted by `member`. Sentinels carry no labels and share with nobody.
    pub fn sharing_with<F>(&self, slot: Slot, member: F) -> BTreeSet<Slot>
    where
        F: Fn(Slot) -> bool,
    {
        let Some(id) = slot.participant() else {
            return BTreeSet::new();
        };
        self.labels_of(id)
            .iter()
            .flat_map(|label| self.reverse.holders(label))
            .map(|holder| Slot::from(*holder))
            .filter(|holder| member(*holder))
            .collect()
    }
}

/// Compile a label pattern, reporting failures as configuration errors
pub fn compile_label_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| PairingError::InvalidLabelPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Pattern matching exactly `label` and nothing else
pub fn exact_label_pattern(label: &str) -> String {
    format!("^{}$", regex::escape(label))
}
