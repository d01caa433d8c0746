//! Pairing Scenario Tests
//!
//! Drives complete runs: every participant builds its own session from the
//! same configuration and the resulting plans are cross-checked.

use pairwise_core::{
    grid_placements, pair_coverage, verify_consistency, Assignment, AssignmentSession,
    FeatureMap, GroupMode, PairMode, PairingConfig, PairingError, ParticipantId,
    RangeFilterMode, SequentialShift, Slot,
};
use std::collections::BTreeMap;

fn id(n: u32) -> ParticipantId {
    ParticipantId::new(n)
}

fn slot(n: u32) -> Slot {
    Slot::from(id(n))
}

fn node_map(nodes: &[&str]) -> FeatureMap {
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (id(i as u32), vec![node.to_string()]))
        .collect()
}

fn grid_map(nodes: u32, slots: u32) -> FeatureMap {
    let placements = grid_placements(nodes, slots);
    FeatureMap::from_placements(placements.iter().map(|(id, p)| (*id, p)), "hwloc")
}

fn run(
    config: &PairingConfig,
    map: Option<&FeatureMap>,
    count: usize,
) -> BTreeMap<ParticipantId, Vec<Assignment>> {
    (0..config.participants)
        .map(|n| {
            let mut session = AssignmentSession::from_config(config, id(n), map.cloned()).unwrap();
            (id(n), session.generate_assignments(count).unwrap())
        })
        .collect()
}

// ============================================================================
// Worked scenarios
// ============================================================================

#[test]
fn shift_returns_the_duple_holding_self() {
    let mut session =
        AssignmentSession::new(4, 4, id(2)).with_strategy(Box::new(SequentialShift::new(0)));
    let first = session.generate_assignments(1).unwrap();
    assert_eq!(first, vec![Assignment(slot(2), slot(3))]);

    let again = AssignmentSession::new(99, 4, id(2))
        .with_strategy(Box::new(SequentialShift::new(0)))
        .generate_assignments(1)
        .unwrap();
    assert_eq!(first, again);
}

#[test]
fn lone_participant_pairs_with_nobody() {
    let mut session = AssignmentSession::new(1, 0, id(5));
    session.set_range(vec![id(5)], 0, 1);
    let out = session.generate_assignments(3).unwrap();
    assert_eq!(out, vec![Assignment(slot(5), Slot::NoPartner); 3]);
    assert_eq!(out[0].as_raw(), [5, -1]);
}

#[test]
fn huge_shift_offset_from_config_is_usable() {
    let config = PairingConfig {
        participants: 4,
        mode: PairMode::Shift,
        shift_offset: usize::MAX,
        ..PairingConfig::default()
    };
    config.validate().unwrap();
    let plans = run(&config, None, 3);
    assert!(verify_consistency(&plans).is_consistent());
    assert!(plans.values().all(|plan| plan.len() == 3));
}

#[test]
fn group_exclusive_never_pairs_nodemates() {
    let config = PairingConfig {
        participants: 4,
        mode: PairMode::GroupExclusive,
        range_filter: Some(RangeFilterMode::GroupExclude),
        ..PairingConfig::default()
    };
    let map = node_map(&["nodeA", "nodeA", "nodeB", "nodeB"]);
    let plans = run(&config, Some(&map), 20);

    for assignment in plans.values().flatten() {
        assert!(!assignment.same_pair(&Assignment(slot(0), slot(1))));
        assert!(!assignment.same_pair(&Assignment(slot(2), slot(3))));
    }
    assert!(verify_consistency(&plans).is_consistent());
}

// ============================================================================
// Agreement across participants
// ============================================================================

#[test]
fn every_mode_agrees_across_participants() {
    let map = grid_map(4, 2);
    for mode in PairMode::ALL {
        let config = PairingConfig {
            seed: 31,
            participants: 8,
            mode,
            block_size: 3,
            ..PairingConfig::default()
        };
        let plans = run(&config, Some(&map), 12);
        let report = verify_consistency(&plans);
        assert!(report.is_consistent(), "{mode}: {:?}", report.mismatches);
        assert!(report.checked > 0, "{mode}");
    }
}

#[test]
fn odd_participant_count_agrees() {
    for mode in [PairMode::Shift, PairMode::Shuffle, PairMode::GroupExclusive] {
        let config = PairingConfig {
            seed: 5,
            participants: 7,
            mode,
            ..PairingConfig::default()
        };
        let map = node_map(&["a", "a", "b", "b", "c", "c", "c"]);
        let plans = run(&config, Some(&map), 9);
        assert!(verify_consistency(&plans).is_consistent(), "{mode}");
        for (me, plan) in &plans {
            assert!(plan.iter().all(|a| a.contains(Slot::from(*me))));
        }
    }
}

#[test]
fn include_filter_keeps_pairs_on_node() {
    let config = PairingConfig {
        seed: 8,
        participants: 8,
        group_mode: Some(GroupMode::Incl),
        label_filter: Some("^node".into()),
        ..PairingConfig::default()
    };
    let map = grid_map(2, 4);
    let plans = run(&config, Some(&map), 6);
    assert!(verify_consistency(&plans).is_consistent());

    // node000 holds 0..4, node001 holds 4..8
    for (a, b) in pair_coverage(plans.values().flatten()).keys() {
        assert_eq!(a.get() / 4, b.get() / 4);
    }
}

#[test]
fn default_sample_count_is_half_plus_one() {
    let config = PairingConfig {
        participants: 10,
        ..PairingConfig::default()
    };
    let mut session = AssignmentSession::from_config(&config, id(3), None).unwrap();
    assert_eq!(session.generate().unwrap().len(), 6);
}

// ============================================================================
// Hierarchical cycling
// ============================================================================

#[test]
fn topology_blocks_are_shared_evenly() {
    // 4 nodes x 2 slots: two groups of four, each scheduled in alternate blocks
    let config = PairingConfig {
        seed: 12,
        participants: 8,
        group_mode: Some(GroupMode::Hwloc),
        block_size: 3,
        ..PairingConfig::default()
    };
    let map = grid_map(4, 2);
    let plans = run(&config, Some(&map), 24);
    assert!(verify_consistency(&plans).is_consistent());

    for (me, plan) in &plans {
        let active = plan
            .iter()
            .filter(|a| a.partner_of(*me).and_then(Slot::participant).is_some())
            .count();
        assert_eq!(active, 12, "participant {me}");
    }
}

#[test]
fn topology_cycle_without_map_fails() {
    let config = PairingConfig {
        participants: 4,
        mode: PairMode::TopologyCycle,
        ..PairingConfig::default()
    };
    let mut session = AssignmentSession::from_config(&config, id(0), None).unwrap();
    assert!(matches!(
        session.generate_assignments(4),
        Err(PairingError::MissingFeatureMap)
    ));
}

// ============================================================================
// Seeds
// ============================================================================

#[test]
fn seed_drives_shuffle_output() {
    let plan = |seed| {
        AssignmentSession::new(seed, 16, id(0))
            .generate_assignments(8)
            .unwrap()
    };
    assert_eq!(plan(3), plan(3));
    assert_ne!(plan(3), plan(4));
}
