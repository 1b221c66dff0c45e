//! Planning of approval configuration writes.
//!
//! The planner turns a submitted configuration into the exact set of level
//! and approver rows to insert, re-rank, or soft-delete. It validates the
//! configuration as it will look after the write, not as submitted.

use std::collections::{BTreeSet, HashMap, HashSet};

use uuid::Uuid;

use crate::approval::error::ApprovalError;
use crate::approval::rank::{check_rank_order, validate_levels};
use crate::approval::types::{ApprovalConfigInput, ApprovalLevelInput};

/// An active approver assignment already stored on a level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingApprover {
    /// `approval_users.id`.
    pub approval_user_id: Uuid,
    /// Employee approving at this level.
    pub approver_id: Uuid,
}

/// An active level already stored for the setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingLevel {
    /// `approval_levels.id`.
    pub id: Uuid,
    /// Current rank.
    pub rank: u32,
    /// Active approvers on the level.
    pub approvers: Vec<ExistingApprover>,
}

/// A level to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLevel {
    /// Rank of the new level.
    pub rank: u32,
    /// Distinct approvers, in submission order.
    pub approver_ids: Vec<Uuid>,
}

/// Row-level changes needed to apply a configuration update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalPlan {
    /// Levels to soft-delete (their approvers go with them).
    pub delete_level_ids: Vec<Uuid>,
    /// Approver assignments to soft-delete.
    pub delete_user_ids: Vec<Uuid>,
    /// Existing levels whose rank changes.
    pub rank_updates: Vec<(Uuid, u32)>,
    /// Levels to insert.
    pub new_levels: Vec<NewLevel>,
    /// Approvers to add to existing levels, as `(level_id, approver_id)`.
    pub new_approvers: Vec<(Uuid, Uuid)>,
}

impl ApprovalPlan {
    /// Returns true if applying the plan changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delete_level_ids.is_empty()
            && self.delete_user_ids.is_empty()
            && self.rank_updates.is_empty()
            && self.new_levels.is_empty()
            && self.new_approvers.is_empty()
    }
}

/// Returns every distinct approver id referenced by the submitted levels.
#[must_use]
pub fn submitted_approver_ids(levels: &[ApprovalLevelInput]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    levels
        .iter()
        .flat_map(|level| level.approver_ids.iter().copied())
        .filter(|id| seen.insert(*id))
        .collect()
}

fn distinct(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Plans a brand-new configuration.
///
/// # Errors
///
/// Fails on empty input, invalid ranks, or a level with no approvers.
pub fn plan_create(levels: &[ApprovalLevelInput]) -> Result<Vec<NewLevel>, ApprovalError> {
    let ranks = validate_levels(levels)?;

    let mut planned: Vec<NewLevel> = levels
        .iter()
        .zip(ranks)
        .map(|(level, rank)| NewLevel {
            rank,
            approver_ids: distinct(&level.approver_ids),
        })
        .collect();

    if let Some(empty) = planned.iter().find(|level| level.approver_ids.is_empty()) {
        return Err(ApprovalError::LevelWithoutApprover(empty.rank));
    }

    planned.sort_by_key(|level| level.rank);
    Ok(planned)
}

/// Plans an update of an existing configuration.
///
/// Levels not mentioned in `input.approvals` keep their rank and approvers
/// unless listed in `delete_approval_level_ids`.
///
/// # Errors
///
/// Fails if deletions reference rows outside the configuration, or if the
/// resulting configuration is empty, badly ranked, or has a level with no
/// approvers.
pub fn plan_update(
    existing: &[ExistingLevel],
    input: &ApprovalConfigInput,
) -> Result<ApprovalPlan, ApprovalError> {
    let by_id: HashMap<Uuid, &ExistingLevel> = existing.iter().map(|l| (l.id, l)).collect();

    let delete_levels: BTreeSet<Uuid> = input.delete_approval_level_ids.iter().copied().collect();
    if let Some(unknown) = delete_levels.iter().find(|id| !by_id.contains_key(id)) {
        return Err(ApprovalError::UnknownApprovalLevel(*unknown));
    }

    let known_users: HashSet<Uuid> = existing
        .iter()
        .flat_map(|l| l.approvers.iter().map(|a| a.approval_user_id))
        .collect();
    let delete_users: BTreeSet<Uuid> = input.delete_user_ids.iter().copied().collect();
    if let Some(unknown) = delete_users.iter().find(|id| !known_users.contains(id)) {
        return Err(ApprovalError::UnknownApprovalUser(*unknown));
    }

    let mut edits: HashMap<Uuid, (u32, &ApprovalLevelInput)> = HashMap::new();
    let mut additions: Vec<(u32, &ApprovalLevelInput)> = Vec::new();
    for level in &input.approvals {
        let rank = level.rank.parse()?;
        match level.id {
            Some(id) if by_id.contains_key(&id) && !delete_levels.contains(&id) => {
                edits.insert(id, (rank, level));
            }
            Some(id) => return Err(ApprovalError::UnknownApprovalLevel(id)),
            None => additions.push((rank, level)),
        }
    }

    let mut plan = ApprovalPlan {
        delete_level_ids: delete_levels.iter().copied().collect(),
        ..ApprovalPlan::default()
    };
    let mut final_ranks = Vec::new();

    for level in existing.iter().filter(|l| !delete_levels.contains(&l.id)) {
        let surviving: Vec<&ExistingApprover> = level
            .approvers
            .iter()
            .filter(|a| !delete_users.contains(&a.approval_user_id))
            .collect();
        plan.delete_user_ids.extend(
            level
                .approvers
                .iter()
                .filter(|a| delete_users.contains(&a.approval_user_id))
                .map(|a| a.approval_user_id),
        );

        let (rank, added) = match edits.get(&level.id) {
            Some((rank, submitted)) => {
                let added: Vec<Uuid> = distinct(&submitted.approver_ids)
                    .into_iter()
                    .filter(|id| !surviving.iter().any(|a| a.approver_id == *id))
                    .collect();
                (*rank, added)
            }
            None => (level.rank, Vec::new()),
        };

        if surviving.is_empty() && added.is_empty() {
            return Err(ApprovalError::LevelWithoutApprover(rank));
        }
        if rank != level.rank {
            plan.rank_updates.push((level.id, rank));
        }
        plan.new_approvers
            .extend(added.into_iter().map(|approver| (level.id, approver)));
        final_ranks.push(rank);
    }

    for (rank, level) in additions {
        let approver_ids = distinct(&level.approver_ids);
        if approver_ids.is_empty() {
            return Err(ApprovalError::LevelWithoutApprover(rank));
        }
        plan.new_levels.push(NewLevel { rank, approver_ids });
        final_ranks.push(rank);
    }

    check_rank_order(&final_ranks)?;
    plan.new_levels.sort_by_key(|level| level.rank);
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::types::RankInput;

    fn existing_level(rank: u32, approvers: &[Uuid]) -> ExistingLevel {
        ExistingLevel {
            id: Uuid::new_v4(),
            rank,
            approvers: approvers
                .iter()
                .map(|approver_id| ExistingApprover {
                    approval_user_id: Uuid::new_v4(),
                    approver_id: *approver_id,
                })
                .collect(),
        }
    }

    fn edit(level: &ExistingLevel, rank: u32, approvers: Vec<Uuid>) -> ApprovalLevelInput {
        ApprovalLevelInput {
            id: Some(level.id),
            rank: RankInput::from(rank),
            approver_ids: approvers,
        }
    }

    #[test]
    fn test_plan_create_sorts_and_dedupes() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let levels = vec![
            ApprovalLevelInput::new(2, vec![b]),
            ApprovalLevelInput::new(1, vec![a, a, b]),
        ];

        let planned = plan_create(&levels).unwrap();
        assert_eq!(
            planned,
            vec![
                NewLevel {
                    rank: 1,
                    approver_ids: vec![a, b],
                },
                NewLevel {
                    rank: 2,
                    approver_ids: vec![b],
                },
            ]
        );
    }

    #[test]
    fn test_plan_create_rejects_level_without_approvers() {
        let levels = vec![
            ApprovalLevelInput::new(1, vec![Uuid::new_v4()]),
            ApprovalLevelInput::new(2, vec![]),
        ];
        assert_eq!(
            plan_create(&levels),
            Err(ApprovalError::LevelWithoutApprover(2))
        );
    }

    #[test]
    fn test_plan_create_rejects_gap() {
        let levels = vec![
            ApprovalLevelInput::new(1, vec![Uuid::new_v4()]),
            ApprovalLevelInput::new(3, vec![Uuid::new_v4()]),
        ];
        assert_eq!(plan_create(&levels), Err(ApprovalError::RankOrderInvalid));
    }

    #[test]
    fn test_plan_update_adds_approver_to_existing_level() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let level = existing_level(1, &[a]);

        let input = ApprovalConfigInput {
            approvals: vec![edit(&level, 1, vec![a, b])],
            ..ApprovalConfigInput::default()
        };

        let plan = plan_update(std::slice::from_ref(&level), &input).unwrap();
        assert_eq!(plan.new_approvers, vec![(level.id, b)]);
        assert!(plan.rank_updates.is_empty());
        assert!(plan.new_levels.is_empty());
    }

    #[test]
    fn test_plan_update_appends_new_level() {
        let level = existing_level(1, &[Uuid::new_v4()]);
        let c = Uuid::new_v4();
        let input = ApprovalConfigInput {
            approvals: vec![ApprovalLevelInput::new(2, vec![c])],
            ..ApprovalConfigInput::default()
        };

        let plan = plan_update(&[level], &input).unwrap();
        assert_eq!(
            plan.new_levels,
            vec![NewLevel {
                rank: 2,
                approver_ids: vec![c],
            }]
        );
    }

    #[test]
    fn test_plan_update_delete_level_requires_reranking() {
        let first = existing_level(1, &[Uuid::new_v4()]);
        let second = existing_level(2, &[Uuid::new_v4()]);

        let input = ApprovalConfigInput {
            delete_approval_level_ids: vec![first.id],
            ..ApprovalConfigInput::default()
        };
        assert_eq!(
            plan_update(&[first.clone(), second.clone()], &input),
            Err(ApprovalError::RankOrderInvalid)
        );

        let input = ApprovalConfigInput {
            approvals: vec![edit(&second, 1, vec![])],
            delete_approval_level_ids: vec![first.id],
            ..ApprovalConfigInput::default()
        };
        let plan = plan_update(&[first.clone(), second.clone()], &input).unwrap();
        assert_eq!(plan.delete_level_ids, vec![first.id]);
        assert_eq!(plan.rank_updates, vec![(second.id, 1)]);
    }

    #[test]
    fn test_plan_update_swapping_ranks() {
        let first = existing_level(1, &[Uuid::new_v4()]);
        let second = existing_level(2, &[Uuid::new_v4()]);

        let input = ApprovalConfigInput {
            approvals: vec![edit(&first, 2, vec![]), edit(&second, 1, vec![])],
            ..ApprovalConfigInput::default()
        };
        let plan = plan_update(&[first.clone(), second.clone()], &input).unwrap();
        assert_eq!(plan.rank_updates.len(), 2);
        assert!(plan.rank_updates.contains(&(first.id, 2)));
        assert!(plan.rank_updates.contains(&(second.id, 1)));
    }

    #[test]
    fn test_plan_update_removing_last_approver_fails() {
        let level = existing_level(1, &[Uuid::new_v4()]);
        let input = ApprovalConfigInput {
            delete_user_ids: vec![level.approvers[0].approval_user_id],
            ..ApprovalConfigInput::default()
        };
        assert_eq!(
            plan_update(std::slice::from_ref(&level), &input),
            Err(ApprovalError::LevelWithoutApprover(1))
        );
    }

    #[test]
    fn test_plan_update_replacing_approver() {
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();
        let level = existing_level(1, &[old]);
        let input = ApprovalConfigInput {
            approvals: vec![edit(&level, 1, vec![new])],
            delete_user_ids: vec![level.approvers[0].approval_user_id],
            ..ApprovalConfigInput::default()
        };

        let plan = plan_update(std::slice::from_ref(&level), &input).unwrap();
        assert_eq!(plan.delete_user_ids, vec![level.approvers[0].approval_user_id]);
        assert_eq!(plan.new_approvers, vec![(level.id, new)]);
    }

    #[test]
    fn test_plan_update_unknown_ids() {
        let level = existing_level(1, &[Uuid::new_v4()]);
        let stray = Uuid::new_v4();

        let input = ApprovalConfigInput {
            delete_approval_level_ids: vec![stray],
            ..ApprovalConfigInput::default()
        };
        assert_eq!(
            plan_update(std::slice::from_ref(&level), &input),
            Err(ApprovalError::UnknownApprovalLevel(stray))
        );

        let input = ApprovalConfigInput {
            delete_user_ids: vec![stray],
            ..ApprovalConfigInput::default()
        };
        assert_eq!(
            plan_update(std::slice::from_ref(&level), &input),
            Err(ApprovalError::UnknownApprovalUser(stray))
        );

        let input = ApprovalConfigInput {
            approvals: vec![ApprovalLevelInput {
                id: Some(stray),
                rank: RankInput::from(1),
                approver_ids: vec![Uuid::new_v4()],
            }],
            ..ApprovalConfigInput::default()
        };
        assert_eq!(
            plan_update(std::slice::from_ref(&level), &input),
            Err(ApprovalError::UnknownApprovalLevel(stray))
        );
    }

    #[test]
    fn test_plan_update_deleting_everything_requires_approval() {
        let level = existing_level(1, &[Uuid::new_v4()]);
        let input = ApprovalConfigInput {
            delete_approval_level_ids: vec![level.id],
            ..ApprovalConfigInput::default()
        };
        assert_eq!(
            plan_update(std::slice::from_ref(&level), &input),
            Err(ApprovalError::ApprovalRequired)
        );
    }

    #[test]
    fn test_plan_update_no_changes_is_empty() {
        let level = existing_level(1, &[Uuid::new_v4()]);
        let plan = plan_update(&[level], &ApprovalConfigInput::default()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_submitted_approver_ids_are_distinct() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let levels = vec![
            ApprovalLevelInput::new(1, vec![a, b]),
            ApprovalLevelInput::new(2, vec![b]),
        ];
        assert_eq!(submitted_approver_ids(&levels), vec![a, b]);
    }
}
