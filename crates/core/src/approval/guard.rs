//! Sole-approver protection for employee deactivation.
//!
//! An employee cannot be deactivated while they are the only active approver
//! on any approval level. When no level depends on them alone, all of their
//! approver assignments are released instead.

use serde::Serialize;

use staffdesk_shared::types::{ApprovalLevelId, ApprovalUserId};

use crate::approval::types::ApprovalModule;
use crate::employee::types::EmploymentType;

/// Fixed prefix of the message returned when deactivation is blocked.
pub const SOLE_APPROVER_MESSAGE: &str = "This user is the only approver for ";

/// Owner reference ids of the approval setting a level belongs to.
///
/// At most one field is normally set, but a setting reused by a client and
/// an inheriting placement can surface several.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerReferences {
    /// Company owning the setting as its timesheet configuration.
    pub client_timesheet_ref: Option<String>,
    /// Company owning the setting as its invoice configuration.
    pub client_invoice_ref: Option<String>,
    /// Placement owning the setting as its timesheet configuration.
    pub placement_timesheet_ref: Option<String>,
    /// Placement owning the setting as its invoice configuration.
    pub placement_invoice_ref: Option<String>,
    /// Set when the level belongs to a tenant-global setting.
    pub global_module: Option<ApprovalModule>,
}

impl OwnerReferences {
    /// Returns the human-readable references in reporting order.
    pub fn labels(&self) -> impl Iterator<Item = String> + '_ {
        [
            &self.client_timesheet_ref,
            &self.client_invoice_ref,
            &self.placement_timesheet_ref,
            &self.placement_invoice_ref,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .chain(
            self.global_module
                .map(|module| format!("global {module} approval")),
        )
    }
}

/// One approval level the employee is matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproverMembership {
    /// The employee's assignment on this level.
    pub approval_user_id: ApprovalUserId,
    /// The level itself.
    pub approval_level_id: ApprovalLevelId,
    /// Active approvers on the level, this employee included.
    pub num_approval_users: i64,
    /// Whether the employee is in fact an approver on this level.
    pub is_approver: bool,
    /// Who owns the level's approval setting.
    pub owners: OwnerReferences,
}

impl ApproverMembership {
    /// Returns true if the level would be left without approvers.
    #[must_use]
    pub const fn is_sole_approver(&self) -> bool {
        self.is_approver && self.num_approval_users == 1
    }
}

/// Outcome of the sole-approver check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Deactivation must be rejected.
    Blocked {
        /// Owner references of every level that depends on the employee alone.
        references: Vec<String>,
    },
    /// Deactivation may proceed; these assignments are to be soft-deleted.
    Allowed {
        /// Approver assignments to release.
        release: Vec<ApprovalUserId>,
    },
}

impl GuardDecision {
    /// Returns true if deactivation is blocked.
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    /// Returns the rejection message for a blocked decision.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Blocked { references } => {
                Some(format!("{SOLE_APPROVER_MESSAGE}{}", references.join(", ")))
            }
            Self::Allowed { .. } => None,
        }
    }
}

/// Stateless evaluator for the sole-approver rule.
pub struct SoleApproverGuard;

impl SoleApproverGuard {
    /// Only internal staff can be approvers, so only they are checked.
    #[must_use]
    pub const fn applies_to(employment_type: EmploymentType) -> bool {
        matches!(employment_type, EmploymentType::Internal)
    }

    /// Decides whether the employee behind `memberships` can be deactivated.
    ///
    /// Rows where `is_approver` is false are ignored. Assignment ids and
    /// references are de-duplicated, keeping first-seen order.
    #[must_use]
    pub fn evaluate(memberships: &[ApproverMembership]) -> GuardDecision {
        let active = memberships.iter().filter(|m| m.is_approver);

        let mut references: Vec<String> = Vec::new();
        let mut blocked = false;
        for membership in active.clone().filter(|m| m.is_sole_approver()) {
            blocked = true;
            for label in membership.owners.labels() {
                if !references.contains(&label) {
                    references.push(label);
                }
            }
        }

        if blocked {
            return GuardDecision::Blocked { references };
        }

        let mut release: Vec<ApprovalUserId> = Vec::new();
        for membership in active {
            if !release.contains(&membership.approval_user_id) {
                release.push(membership.approval_user_id);
            }
        }

        GuardDecision::Allowed { release }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(count: i64, owners: OwnerReferences) -> ApproverMembership {
        ApproverMembership {
            approval_user_id: ApprovalUserId::new(),
            approval_level_id: ApprovalLevelId::new(),
            num_approval_users: count,
            is_approver: true,
            owners,
        }
    }

    fn client_timesheet(reference: &str) -> OwnerReferences {
        OwnerReferences {
            client_timesheet_ref: Some(reference.to_string()),
            ..OwnerReferences::default()
        }
    }

    #[test]
    fn test_sole_approver_is_blocked() {
        let rows = vec![membership(1, client_timesheet("CLI-0001"))];

        let decision = SoleApproverGuard::evaluate(&rows);
        assert!(decision.is_blocked());
        assert_eq!(
            decision.message().unwrap(),
            "This user is the only approver for CLI-0001"
        );
    }

    #[test]
    fn test_shared_levels_are_released() {
        let rows = vec![
            membership(2, client_timesheet("CLI-0001")),
            membership(3, client_timesheet("CLI-0002")),
        ];

        let decision = SoleApproverGuard::evaluate(&rows);
        assert_eq!(
            decision,
            GuardDecision::Allowed {
                release: vec![rows[0].approval_user_id, rows[1].approval_user_id],
            }
        );
        assert!(decision.message().is_none());
    }

    #[test]
    fn test_no_memberships_allows_without_release() {
        let decision = SoleApproverGuard::evaluate(&[]);
        assert_eq!(decision, GuardDecision::Allowed { release: vec![] });
    }

    #[test]
    fn test_one_sole_level_blocks_everything() {
        let rows = vec![
            membership(2, client_timesheet("CLI-0001")),
            membership(
                1,
                OwnerReferences {
                    placement_invoice_ref: Some("PLC-0007".into()),
                    ..OwnerReferences::default()
                },
            ),
        ];

        let decision = SoleApproverGuard::evaluate(&rows);
        assert_eq!(
            decision,
            GuardDecision::Blocked {
                references: vec!["PLC-0007".into()],
            }
        );
    }

    #[test]
    fn test_references_aggregate_across_rows_without_duplicates() {
        let shared = OwnerReferences {
            client_timesheet_ref: Some("CLI-0001".into()),
            placement_timesheet_ref: Some("PLC-0003".into()),
            ..OwnerReferences::default()
        };
        let rows = vec![
            membership(1, shared.clone()),
            membership(1, shared),
            membership(
                1,
                OwnerReferences {
                    client_invoice_ref: Some("CLI-0009".into()),
                    ..OwnerReferences::default()
                },
            ),
        ];

        let decision = SoleApproverGuard::evaluate(&rows);
        assert_eq!(
            decision.message().unwrap(),
            "This user is the only approver for CLI-0001, PLC-0003, CLI-0009"
        );
    }

    #[test]
    fn test_global_setting_is_labelled() {
        let rows = vec![membership(
            1,
            OwnerReferences {
                global_module: Some(ApprovalModule::Timesheet),
                ..OwnerReferences::default()
            },
        )];

        let decision = SoleApproverGuard::evaluate(&rows);
        assert_eq!(
            decision.message().unwrap(),
            "This user is the only approver for global timesheet approval"
        );
    }

    #[test]
    fn test_rows_without_approver_flag_are_ignored() {
        let mut row = membership(1, client_timesheet("CLI-0001"));
        row.is_approver = false;

        let decision = SoleApproverGuard::evaluate(&[row]);
        assert_eq!(decision, GuardDecision::Allowed { release: vec![] });
    }

    #[test]
    fn test_same_assignment_joined_twice_is_released_once() {
        let first = membership(2, client_timesheet("CLI-0001"));
        let mut second = first.clone();
        second.owners = OwnerReferences {
            placement_timesheet_ref: Some("PLC-0001".into()),
            ..OwnerReferences::default()
        };

        let decision = SoleApproverGuard::evaluate(&[first.clone(), second]);
        assert_eq!(
            decision,
            GuardDecision::Allowed {
                release: vec![first.approval_user_id],
            }
        );
    }

    #[test]
    fn test_only_internal_employees_are_checked() {
        assert!(SoleApproverGuard::applies_to(EmploymentType::Internal));
        assert!(!SoleApproverGuard::applies_to(EmploymentType::Consultant));
    }
}
