//! Property-based tests for approval rank ordering and the sole-approver guard.

use proptest::prelude::*;

use staffdesk_shared::types::{ApprovalLevelId, ApprovalUserId};

use crate::approval::error::ApprovalError;
use crate::approval::guard::{ApproverMembership, GuardDecision, OwnerReferences, SoleApproverGuard};
use crate::approval::rank::{check_rank_order, is_rank_order_valid};

/// Strategy producing a shuffled permutation of `1..=n`.
fn arb_permutation() -> impl Strategy<Value = Vec<u32>> {
    (1u32..20).prop_flat_map(|n| Just((1..=n).collect::<Vec<_>>()).prop_shuffle())
}

/// Strategy producing a membership with a given approver count range.
fn arb_membership(counts: std::ops::Range<i64>) -> impl Strategy<Value = ApproverMembership> {
    (counts, "[A-Z]{3}-[0-9]{4}").prop_map(|(count, reference)| ApproverMembership {
        approval_user_id: ApprovalUserId::new(),
        approval_level_id: ApprovalLevelId::new(),
        num_approval_users: count,
        is_approver: true,
        owners: OwnerReferences {
            client_timesheet_ref: Some(reference),
            ..OwnerReferences::default()
        },
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any permutation of 1..=N is a valid rank order.
    #[test]
    fn prop_permutations_are_valid(ranks in arb_permutation()) {
        prop_assert!(is_rank_order_valid(&ranks));
    }

    /// Repeating any rank makes the order invalid with a duplicate error.
    #[test]
    fn prop_duplicates_are_rejected(
        mut ranks in arb_permutation(),
        pick in any::<prop::sample::Index>(),
    ) {
        let duplicate = ranks[pick.index(ranks.len())];
        ranks.push(duplicate);
        prop_assert_eq!(check_rank_order(&ranks), Err(ApprovalError::DuplicateRank(duplicate)));
    }

    /// Shifting every rank up by a positive offset breaks the order.
    #[test]
    fn prop_offset_ranks_are_rejected(ranks in arb_permutation(), offset in 1u32..5) {
        let shifted: Vec<u32> = ranks.iter().map(|r| r + offset).collect();
        prop_assert_eq!(check_rank_order(&shifted), Err(ApprovalError::RankOrderInvalid));
    }

    /// Removing any rank other than the highest leaves a gap.
    #[test]
    fn prop_gaps_are_rejected(ranks in arb_permutation()) {
        let max = ranks.len() as u32;
        prop_assume!(max > 1);
        let with_gap: Vec<u32> = ranks.into_iter().filter(|r| *r != 1).collect();
        prop_assert!(!is_rank_order_valid(&with_gap));
    }

    /// Employees sharing every level are never blocked and release every row.
    #[test]
    fn prop_shared_levels_release_all(rows in prop::collection::vec(arb_membership(2..10), 0..8)) {
        let decision = SoleApproverGuard::evaluate(&rows);
        match decision {
            GuardDecision::Allowed { release } => {
                prop_assert_eq!(release.len(), rows.len());
            }
            GuardDecision::Blocked { .. } => prop_assert!(false, "shared levels must not block"),
        }
    }

    /// A single sole-approver level blocks deactivation and is named in the message.
    #[test]
    fn prop_sole_level_blocks(
        shared in prop::collection::vec(arb_membership(2..10), 0..5),
        sole in arb_membership(1..2),
    ) {
        let reference = sole.owners.client_timesheet_ref.clone().unwrap();
        let mut rows = shared;
        rows.push(sole);

        let decision = SoleApproverGuard::evaluate(&rows);
        prop_assert!(decision.is_blocked());
        prop_assert!(decision.message().unwrap().contains(&reference));
    }
}
