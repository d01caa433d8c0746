//! Property tests for pair assignment

use pairwise_core::{
    verify_consistency, Assignment, AssignmentSession, FeatureMap, PairMode, PairingConfig,
    ParticipantId, RangeFilter, Slot,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn plans_for(
    config: &PairingConfig,
    map: &FeatureMap,
    count: usize,
) -> BTreeMap<ParticipantId, Vec<Assignment>> {
    (0..config.participants)
        .map(|n| {
            let me = ParticipantId::new(n);
            let mut session = AssignmentSession::from_config(config, me, Some(map.clone())).unwrap();
            (me, session.generate_assignments(count).unwrap())
        })
        .collect()
}

/// One node label per participant
fn node_assignment() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..4, 1..14)
}

fn map_from_nodes(nodes: &[u8]) -> FeatureMap {
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (ParticipantId::new(i as u32), vec![format!("node{node}")]))
        .collect()
}

proptest! {
    #[test]
    fn every_assignment_holds_self(
        seed in any::<u64>(),
        size in 1u32..24,
        me in 0u32..24,
        mode in prop::sample::select(PairMode::ALL.to_vec()),
    ) {
        prop_assume!(me < size);
        let config = PairingConfig { seed, participants: size, mode, block_size: 2, ..PairingConfig::default() };
        let map: FeatureMap = (0..size)
            .map(|n| (ParticipantId::new(n), vec![format!("hwloc_{}", n % 3)]))
            .collect();
        let mut session = AssignmentSession::from_config(&config, ParticipantId::new(me), Some(map)).unwrap();
        let out = session.generate_assignments(7).unwrap();
        prop_assert_eq!(out.len(), 7);
        for assignment in out {
            prop_assert!(assignment.contains(Slot::from(ParticipantId::new(me))));
        }
    }

    #[test]
    fn normalized_range_is_even_and_keeps_order(ids in prop::collection::vec(0u32..64, 0..20)) {
        let mut range = RangeFilter::new(ParticipantId::new(0));
        let slots: Vec<Slot> = ids.iter().map(|n| Slot::from(ParticipantId::new(*n))).collect();
        range.set_range(slots.clone(), 0, 1);
        range.normalize();
        prop_assert!(!range.is_empty());
        prop_assert_eq!(range.len() % 2, 0);
        if !slots.is_empty() {
            prop_assert_eq!(&range.as_slice()[..slots.len()], slots.as_slice());
        }
    }

    #[test]
    fn group_exclusive_never_pairs_label_sharers(seed in any::<u64>(), nodes in node_assignment()) {
        let config = PairingConfig {
            seed,
            participants: nodes.len() as u32,
            mode: PairMode::GroupExclusive,
            ..PairingConfig::default()
        };
        let plans = plans_for(&config, &map_from_nodes(&nodes), 5);
        for assignment in plans.values().flatten() {
            if let (Slot::Participant(a), Slot::Participant(b)) = (assignment.0, assignment.1) {
                prop_assert_ne!(nodes[a.get() as usize], nodes[b.get() as usize]);
            }
        }
        prop_assert!(verify_consistency(&plans).is_consistent());
    }

    #[test]
    fn shuffle_plans_agree(seed in any::<u64>(), size in 1u32..20, count in 1usize..12) {
        let config = PairingConfig { seed, participants: size, ..PairingConfig::default() };
        let map: FeatureMap = (0..size).map(|n| (ParticipantId::new(n), vec!["all".to_string()])).collect();
        let plans = plans_for(&config, &map, count);
        let report = verify_consistency(&plans);
        prop_assert!(report.is_consistent(), "{:?}", report.mismatches);
    }
}
