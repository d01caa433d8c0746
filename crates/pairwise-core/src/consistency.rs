//! Cross-participant agreement checks
//!
//! Offline counterpart of the barrier the benchmarking loop places between
//! computing assignments and using them: given every participant's plan for
//! one run, confirm each named partner names the participant back.

use crate::types::{Assignment, ParticipantId, Slot};
use serde::Serialize;
use std::collections::BTreeMap;

/// One draw where two participants disagree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub participant: ParticipantId,
    pub iteration: usize,
    pub assignment: Assignment,
    /// What the named partner holds for the same draw, if it has a plan
    pub partner_assignment: Option<Assignment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    /// Draws with a real partner that were cross-checked
    pub checked: usize,
    /// Draws where self is missing from its own assignment
    pub self_missing: usize,
    pub mismatches: Vec<Mismatch>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty() && self.self_missing == 0
    }
}

/// Check that the plans of one run describe a single global pairing per draw.
///
/// Draws paired with a sentinel, and unassigned draws, have nothing to agree
/// on and are skipped.
pub fn verify_consistency(plans: &BTreeMap<ParticipantId, Vec<Assignment>>) -> ConsistencyReport {
    let mut report = ConsistencyReport::default();

    for (participant, plan) in plans {
        for (iteration, assignment) in plan.iter().enumerate() {
            if *assignment == Assignment::UNASSIGNED {
                continue;
            }
            let Some(partner) = assignment.partner_of(*participant) else {
                tracing::error!(
                    %participant,
                    iteration,
                    %assignment,
                    "Assignment does not contain its owner"
                );
                report.self_missing += 1;
                continue;
            };
            let Some(partner) = partner.participant() else {
                continue;
            };

            report.checked += 1;
            let theirs = plans.get(&partner).and_then(|p| p.get(iteration)).copied();
            if theirs.map_or(true, |t| !t.same_pair(assignment)) {
                tracing::warn!(
                    %participant,
                    %partner,
                    iteration,
                    %assignment,
                    ?theirs,
                    "Partner disagrees on pairing"
                );
                report.mismatches.push(Mismatch {
                    participant: *participant,
                    iteration,
                    assignment: *assignment,
                    partner_assignment: theirs,
                });
            }
        }
    }
    report
}

/// How often each unordered pair of real participants was drawn
pub fn pair_coverage<'a, I>(assignments: I) -> BTreeMap<(ParticipantId, ParticipantId), usize>
where
    I: IntoIterator<Item = &'a Assignment>,
{
    let mut coverage = BTreeMap::new();
    for Assignment(a, b) in assignments {
        if let (Slot::Participant(a), Slot::Participant(b)) = (*a, *b) {
            let key = if a <= b { (a, b) } else { (b, a) };
            *coverage.entry(key).or_insert(0) += 1;
        }
    }
    coverage
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u32) -> Slot {
        Slot::from(ParticipantId::new(n))
    }

    fn plans(entries: &[(u32, Vec<Assignment>)]) -> BTreeMap<ParticipantId, Vec<Assignment>> {
        entries
            .iter()
            .map(|(id, plan)| (ParticipantId::new(*id), plan.clone()))
            .collect()
    }

    #[test]
    fn agreeing_plans() {
        let plans = plans(&[
            (0, vec![Assignment(p(0), p(1)), Assignment(p(2), p(0))]),
            (1, vec![Assignment(p(0), p(1)), Assignment(p(1), Slot::Padding)]),
            (2, vec![Assignment::UNASSIGNED, Assignment(p(2), p(0))]),
        ]);
        let report = verify_consistency(&plans);
        assert!(report.is_consistent());
        assert_eq!(report.checked, 4);
    }

    #[test]
    fn disagreement_is_reported() {
        let plans = plans(&[
            (0, vec![Assignment(p(0), p(1))]),
            (1, vec![Assignment(p(1), p(2))]),
            (2, vec![Assignment(p(1), p(2))]),
        ]);
        let report = verify_consistency(&plans);
        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.mismatches[0].participant, ParticipantId::new(0));
        assert_eq!(
            report.mismatches[0].partner_assignment,
            Some(Assignment(p(1), p(2)))
        );
    }

    #[test]
    fn missing_partner_plan_and_missing_self() {
        let plans = plans(&[(0, vec![Assignment(p(0), p(7)), Assignment(p(3), p(4))])]);
        let report = verify_consistency(&plans);
        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.mismatches[0].partner_assignment, None);
        assert_eq!(report.self_missing, 1);
        assert!(!report.is_consistent());
    }

    #[test]
    fn coverage_counts_unordered_pairs() {
        let draws = [
            Assignment(p(0), p(1)),
            Assignment(p(1), p(0)),
            Assignment(p(2), Slot::NoPartner),
            Assignment(p(3), p(2)),
        ];
        let coverage = pair_coverage(&draws);
        assert_eq!(coverage[&(ParticipantId::new(0), ParticipantId::new(1))], 2);
        assert_eq!(coverage[&(ParticipantId::new(2), ParticipantId::new(3))], 1);
        assert_eq!(coverage.len(), 2);
    }
}
