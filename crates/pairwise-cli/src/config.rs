//! Run configuration assembled from file, environment and flags

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use pairwise_core::{
    grid_placements, FeatureMap, GroupMode, PairMode, PairingConfig, RangeFilterMode,
};
use std::path::{Path, PathBuf};

/// Flags shared by every command; each one overrides the config file
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Shared stream seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Total participant count
    #[arg(short = 'n', long)]
    pub participants: Option<u32>,

    /// Draws per participant (default: half the range plus one)
    #[arg(long)]
    pub samples: Option<usize>,

    /// Pairing mode: shift, shuffle, group-exclusive or topology-cycle
    #[arg(long)]
    pub mode: Option<PairMode>,

    /// Range filter: include, exclude or group-exclude
    #[arg(long)]
    pub range_filter: Option<RangeFilterMode>,

    /// Regular expression narrowing the labels of the feature map
    #[arg(long)]
    pub label_filter: Option<String>,

    /// Shorthand for mode plus filter: incl, groupexcl or hwloc
    #[arg(long)]
    pub group_mode: Option<GroupMode>,

    /// JSON file mapping participant ids to label lists
    #[arg(long, conflicts_with = "grid")]
    pub feature_map: Option<PathBuf>,

    /// Synthetic layout `<nodes>x<slots>` instead of a feature map file
    #[arg(long)]
    pub grid: Option<String>,
}

impl RunArgs {
    /// Config file (or defaults), then `PAIRWISE_*` variables, then flags.
    ///
    /// Without an explicit `--participants`, a `--grid` sets the count.
    pub fn resolve(&self, config_path: Option<&Path>) -> Result<PairingConfig> {
        let mut config = match config_path {
            Some(path) => PairingConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => PairingConfig::default(),
        };
        config.merge_with_env()?;
        self.apply_overrides(&mut config);

        if self.participants.is_none() {
            if let Some((nodes, slots)) = self.grid_shape()? {
                config.participants = nodes * slots;
            }
        }
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut PairingConfig) {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(participants) = self.participants {
            config.participants = participants;
        }
        if self.samples.is_some() {
            config.samples = self.samples;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if self.range_filter.is_some() {
            config.range_filter = self.range_filter;
        }
        if self.label_filter.is_some() {
            config.label_filter = self.label_filter.clone();
        }
        if self.group_mode.is_some() {
            config.group_mode = self.group_mode;
        }
    }

    fn grid_shape(&self) -> Result<Option<(u32, u32)>> {
        self.grid.as_deref().map(parse_grid).transpose()
    }

    /// Feature map from `--feature-map` or `--grid`, if either is given
    pub fn load_feature_map(&self, config: &PairingConfig) -> Result<Option<FeatureMap>> {
        if let Some(path) = &self.feature_map {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read feature map {}", path.display()))?;
            let map: FeatureMap = serde_json::from_str(&content)
                .with_context(|| format!("Invalid feature map in {}", path.display()))?;
            tracing::info!(path = %path.display(), participants = map.len(), "Loaded feature map");
            return Ok(Some(map));
        }

        let Some((nodes, slots)) = self.grid_shape()? else {
            return Ok(None);
        };
        if nodes * slots != config.participants {
            tracing::warn!(
                nodes,
                slots,
                participants = config.participants,
                "Grid size differs from participant count"
            );
        }
        let placements = grid_placements(nodes, slots);
        Ok(Some(FeatureMap::from_placements(
            placements.iter().map(|(id, placement)| (*id, placement)),
            &config.topology_prefix,
        )))
    }
}

/// Parse `<nodes>x<slots>`
pub fn parse_grid(layout: &str) -> Result<(u32, u32)> {
    let (nodes, slots) = layout
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("Grid must look like <nodes>x<slots>, got {layout:?}"))?;
    let nodes: u32 = nodes.trim().parse().context("Invalid node count in grid")?;
    let slots: u32 = slots.trim().parse().context("Invalid slot count in grid")?;
    if nodes == 0 || slots == 0 {
        bail!("Grid dimensions must be greater than 0");
    }
    nodes
        .checked_mul(slots)
        .ok_or_else(|| anyhow!("Grid {layout} is too large"))?;
    Ok((nodes, slots))
}
