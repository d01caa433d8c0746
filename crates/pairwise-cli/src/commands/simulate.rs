//! Simulate a whole run and cross-check every participant's plan

use crate::config::RunArgs;
use anyhow::{bail, Result};
use clap::Args;
use pairwise_core::{
    pair_coverage, verify_consistency, AssignmentSession, ConsistencyReport, PairMode,
    ParticipantId,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Debug, Serialize)]
pub struct SimulationSummary {
    pub participants: u32,
    pub mode: PairMode,
    pub seed: u64,
    /// Draws per participant
    pub draws: usize,
    /// Distinct unordered pairs of real participants that were drawn
    pub distinct_pairs: usize,
    /// Largest number of draws any single pair received
    pub max_pair_count: usize,
    pub report: ConsistencyReport,
}

pub fn simulate(run: &RunArgs, config_path: Option<&Path>) -> Result<SimulationSummary> {
    let config = run.resolve(config_path)?;
    let feature_map = run.load_feature_map(&config)?;

    let mut plans = BTreeMap::new();
    let mut mode = config.effective_mode();
    let mut draws = 0;
    for n in 0..config.participants {
        let participant = ParticipantId::new(n);
        let mut session = AssignmentSession::from_config(&config, participant, feature_map.clone())?;
        let plan = session.generate()?;
        tracing::debug!(%participant, draws = plan.len(), "Generated plan");
        mode = session.mode();
        draws = draws.max(plan.len());
        plans.insert(participant, plan);
    }

    let report = verify_consistency(&plans);
    // each real pair is seen once from either side
    let coverage = pair_coverage(plans.values().flatten());
    Ok(SimulationSummary {
        participants: config.participants,
        mode,
        seed: config.seed,
        draws,
        distinct_pairs: coverage.len(),
        max_pair_count: coverage.values().map(|count| count / 2).max().unwrap_or(0),
        report,
    })
}

pub fn handle_simulate_command(cmd: &SimulateCommand, config_path: Option<&Path>) -> Result<()> {
    let summary = simulate(&cmd.run, config_path)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{} participants, mode {}, seed {}, {} draws each",
            summary.participants, summary.mode, summary.seed, summary.draws
        );
        println!("checked:        {}", summary.report.checked);
        println!("mismatches:     {}", summary.report.mismatches.len());
        println!("self missing:   {}", summary.report.self_missing);
        println!("distinct pairs: {}", summary.distinct_pairs);
        println!("max pair count: {}", summary.max_pair_count);
    }

    if !summary.report.is_consistent() {
        bail!(
            "Plans disagree: {} mismatches, {} draws without self",
            summary.report.mismatches.len(),
            summary.report.self_missing
        );
    }
    tracing::info!(checked = summary.report.checked, "All plans agree");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairwise_core::GroupMode;

    #[test]
    fn shuffle_run_agrees() {
        let run = RunArgs {
            seed: Some(11),
            participants: Some(10),
            ..RunArgs::default()
        };
        let summary = simulate(&run, None).unwrap();
        assert!(summary.report.is_consistent());
        assert_eq!(summary.draws, 6);
        assert_eq!(summary.mode, PairMode::Shuffle);
        assert!(summary.distinct_pairs > 0);
    }

    #[test]
    fn topology_run_on_grid_agrees() {
        let run = RunArgs {
            grid: Some("4x2".into()),
            group_mode: Some(GroupMode::Hwloc),
            samples: Some(20),
            ..RunArgs::default()
        };
        let summary = simulate(&run, None).unwrap();
        assert_eq!(summary.participants, 8);
        assert_eq!(summary.mode, PairMode::TopologyCycle);
        assert!(summary.report.is_consistent());
    }

    #[test]
    fn group_exclusive_run_agrees() {
        let run = RunArgs {
            grid: Some("3x3".into()),
            group_mode: Some(GroupMode::GroupExcl),
            label_filter: Some("^node".into()),
            ..RunArgs::default()
        };
        let summary = simulate(&run, None).unwrap();
        assert!(summary.report.is_consistent());
        assert_eq!(summary.mode, PairMode::GroupExclusive);
    }
}
