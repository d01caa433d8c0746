//! Plan the assignment list of one participant

use crate::config::RunArgs;
use anyhow::{bail, Result};
use clap::Args;
use pairwise_core::{Assignment, AssignmentSession, PairMode, ParticipantId};
use serde::Serialize;
use std::path::Path;

#[derive(Args, Debug)]
pub struct PlanCommand {
    /// Participant to plan for
    #[arg(short, long)]
    pub participant: u32,

    #[command(flatten)]
    pub run: RunArgs,
}

/// JSON document printed by `pairwise plan`
#[derive(Debug, Serialize)]
pub struct PlanOutput {
    pub participant: ParticipantId,
    pub mode: PairMode,
    pub seed: u64,
    pub assignments: Vec<Assignment>,
}

pub fn build_plan(cmd: &PlanCommand, config_path: Option<&Path>) -> Result<PlanOutput> {
    let config = cmd.run.resolve(config_path)?;
    if cmd.participant >= config.participants {
        bail!(
            "Participant {} is outside a run of {} participants",
            cmd.participant,
            config.participants
        );
    }

    let feature_map = cmd.run.load_feature_map(&config)?;
    let participant = ParticipantId::new(cmd.participant);
    let mut session = AssignmentSession::from_config(&config, participant, feature_map)?;
    let assignments = session.generate()?;

    Ok(PlanOutput {
        participant,
        mode: session.mode(),
        seed: config.seed,
        assignments,
    })
}

pub fn handle_plan_command(cmd: &PlanCommand, config_path: Option<&Path>) -> Result<()> {
    let plan = build_plan(cmd, config_path)?;
    tracing::info!(
        participant = %plan.participant,
        mode = %plan.mode,
        draws = plan.assignments.len(),
        "Planned assignments"
    );
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairwise_core::Slot;

    fn command(participant: u32, run: RunArgs) -> PlanCommand {
        PlanCommand { participant, run }
    }

    #[test]
    fn plan_holds_the_participant() {
        let run = RunArgs {
            participants: Some(8),
            samples: Some(5),
            ..RunArgs::default()
        };
        let plan = build_plan(&command(3, run), None).unwrap();
        assert_eq!(plan.assignments.len(), 5);
        let me = Slot::from(ParticipantId::new(3));
        assert!(plan.assignments.iter().all(|a| a.contains(me)));
    }

    #[test]
    fn plan_serializes_raw_ids() {
        let run = RunArgs {
            participants: Some(1),
            samples: Some(1),
            ..RunArgs::default()
        };
        let plan = build_plan(&command(0, run), None).unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["assignments"], serde_json::json!([[0, -1]]));
        assert_eq!(json["mode"], "shuffle");
    }

    #[test]
    fn participant_out_of_range() {
        let run = RunArgs {
            participants: Some(4),
            ..RunArgs::default()
        };
        assert!(build_plan(&command(4, run), None).is_err());
    }
}
