//! Pairing run configuration

use crate::errors::{PairingError, Result};
use crate::features::{compile_label_pattern, DEFAULT_TOPOLOGY_PREFIX};
use crate::range::RangeFilterMode;
use crate::strategy::{PairMode, StrategyOptions, DEFAULT_BLOCK_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Operator shorthand selecting a mode and range filter together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    /// Shuffle among participants sharing a label with self
    Incl,
    /// Group-exclusive pairing
    GroupExcl,
    /// Cycle through topology groups
    Hwloc,
}

impl GroupMode {
    pub fn pair_mode(self) -> PairMode {
        match self {
            GroupMode::Incl => PairMode::Shuffle,
            GroupMode::GroupExcl => PairMode::GroupExclusive,
            GroupMode::Hwloc => PairMode::TopologyCycle,
        }
    }

    pub fn range_filter(self) -> Option<RangeFilterMode> {
        match self {
            GroupMode::Incl => Some(RangeFilterMode::Include),
            GroupMode::GroupExcl => Some(RangeFilterMode::GroupExclude),
            GroupMode::Hwloc => None,
        }
    }
}

impl FromStr for GroupMode {
    type Err = PairingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "incl" => Ok(GroupMode::Incl),
            "groupexcl" => Ok(GroupMode::GroupExcl),
            "hwloc" => Ok(GroupMode::Hwloc),
            other => Err(PairingError::UnknownGroupMode(other.to_string())),
        }
    }
}

/// Settings every participant of a run must share
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Shared stream seed
    pub seed: u64,
    /// Total participant count
    pub participants: u32,
    /// Draws per participant; `None` means half the range plus one
    pub samples: Option<usize>,
    pub mode: PairMode,
    pub range_filter: Option<RangeFilterMode>,
    /// Regular expression narrowing the labels of the feature map
    pub label_filter: Option<String>,
    /// Overrides `mode` and `range_filter` when set
    pub group_mode: Option<GroupMode>,
    pub shift_offset: usize,
    pub block_size: usize,
    pub topology_prefix: String,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            seed: 2,
            participants: 2,
            samples: None,
            mode: PairMode::default(),
            range_filter: None,
            label_filter: None,
            group_mode: None,
            shift_offset: 0,
            block_size: DEFAULT_BLOCK_SIZE,
            topology_prefix: DEFAULT_TOPOLOGY_PREFIX.to_string(),
        }
    }
}

impl PairingConfig {
    /// Load from a `.toml` or `.json` file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PairingError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|e| {
                PairingError::Config(format!("Invalid TOML in {}: {e}", path.display()))
            }),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Err(PairingError::Config(format!(
                "Unsupported config format: {}",
                path.display()
            ))),
        }
    }

    /// Apply `PAIRWISE_*` environment overrides
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable source
    pub fn merge_with_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(seed) = lookup("PAIRWISE_SEED") {
            self.seed = seed
                .parse()
                .map_err(|_| PairingError::invalid("Invalid seed in PAIRWISE_SEED"))?;
        }
        if let Some(participants) = lookup("PAIRWISE_PARTICIPANTS") {
            self.participants = participants.parse().map_err(|_| {
                PairingError::invalid("Invalid participant count in PAIRWISE_PARTICIPANTS")
            })?;
        }
        if let Some(samples) = lookup("PAIRWISE_SAMPLES") {
            self.samples = Some(
                samples
                    .parse()
                    .map_err(|_| PairingError::invalid("Invalid sample count in PAIRWISE_SAMPLES"))?,
            );
        }
        if let Some(mode) = lookup("PAIRWISE_MODE") {
            self.mode = mode.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.participants == 0 {
            return Err(PairingError::invalid("participants must be greater than 0"));
        }
        if self.block_size == 0 {
            return Err(PairingError::invalid("block_size must be greater than 0"));
        }
        if self.samples == Some(0) {
            return Err(PairingError::invalid("samples must be greater than 0"));
        }
        if self.topology_prefix.is_empty() {
            return Err(PairingError::invalid("topology_prefix must not be empty"));
        }
        if let Some(pattern) = self.label_filter.as_deref().filter(|p| !p.is_empty()) {
            compile_label_pattern(pattern)?;
        }
        Ok(())
    }

    pub fn effective_mode(&self) -> PairMode {
        self.group_mode.map_or(self.mode, GroupMode::pair_mode)
    }

    pub fn effective_range_filter(&self) -> Option<RangeFilterMode> {
        match self.group_mode {
            Some(group_mode) => group_mode.range_filter(),
            None => self.range_filter,
        }
    }

    pub fn strategy_options(&self) -> StrategyOptions {
        StrategyOptions {
            shift_offset: self.shift_offset,
            block_size: self.block_size,
            topology_prefix: self.topology_prefix.clone(),
        }
    }
}
