//! Rank ordering rules for multi-level approval chains.
//!
//! An approval setting with N levels must use exactly the ranks `1..=N`,
//! each once. The order in which levels are submitted does not matter.

use std::collections::BTreeSet;

use crate::approval::error::ApprovalError;
use crate::approval::types::ApprovalLevelInput;

/// Returns true if `ranks` is exactly `{1, 2, ..., N}` for `N = ranks.len()`.
///
/// Duplicates, gaps, ranks not starting at 1, and empty input are invalid.
#[must_use]
pub fn is_rank_order_valid(ranks: &[u32]) -> bool {
    check_rank_order(ranks).is_ok()
}

/// Checks rank ordering, reporting why the ranks are invalid.
///
/// # Errors
///
/// - `ApprovalRequired` when no ranks are given
/// - `DuplicateRank` when a rank appears more than once
/// - `RankOrderInvalid` when the distinct ranks are not contiguous from 1
pub fn check_rank_order(ranks: &[u32]) -> Result<(), ApprovalError> {
    if ranks.is_empty() {
        return Err(ApprovalError::ApprovalRequired);
    }

    let mut distinct = BTreeSet::new();
    for rank in ranks {
        if !distinct.insert(*rank) {
            return Err(ApprovalError::DuplicateRank(*rank));
        }
    }

    let contiguous = (1u32..).zip(&distinct).all(|(expected, actual)| expected == *actual);
    if !contiguous {
        return Err(ApprovalError::RankOrderInvalid);
    }

    Ok(())
}

/// Parses the ranks of submitted levels and checks their ordering.
///
/// Returns the parsed ranks in submission order.
pub fn validate_levels(levels: &[ApprovalLevelInput]) -> Result<Vec<u32>, ApprovalError> {
    if levels.is_empty() {
        return Err(ApprovalError::ApprovalRequired);
    }

    let ranks = levels
        .iter()
        .map(|level| level.rank.parse())
        .collect::<Result<Vec<_>, _>>()?;

    check_rank_order(&ranks)?;
    Ok(ranks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::types::RankInput;
    use rstest::rstest;

    #[rstest]
    #[case(&[1], true)]
    #[case(&[1, 2, 3], true)]
    #[case(&[2, 1], true)]
    #[case(&[3, 1, 2], true)]
    #[case(&[1, 3], false)]
    #[case(&[2, 3], false)]
    #[case(&[1, 1, 2], false)]
    #[case(&[], false)]
    fn test_is_rank_order_valid(#[case] ranks: &[u32], #[case] expected: bool) {
        assert_eq!(is_rank_order_valid(ranks), expected);
    }

    #[test]
    fn test_duplicate_reported_before_gap() {
        assert_eq!(
            check_rank_order(&[1, 1, 3]),
            Err(ApprovalError::DuplicateRank(1))
        );
    }

    #[test]
    fn test_gap_reported_as_rank_order_invalid() {
        assert_eq!(check_rank_order(&[1, 3]), Err(ApprovalError::RankOrderInvalid));
    }

    #[test]
    fn test_empty_requires_approval() {
        assert_eq!(check_rank_order(&[]), Err(ApprovalError::ApprovalRequired));
        assert_eq!(validate_levels(&[]), Err(ApprovalError::ApprovalRequired));
    }

    #[test]
    fn test_validate_levels_mixed_rank_representations() {
        let levels = vec![
            ApprovalLevelInput {
                id: None,
                rank: RankInput::Text("2".into()),
                approver_ids: vec![],
            },
            ApprovalLevelInput {
                id: None,
                rank: RankInput::Number(1),
                approver_ids: vec![],
            },
        ];
        assert_eq!(validate_levels(&levels), Ok(vec![2, 1]));
    }

    #[test]
    fn test_validate_levels_bad_rank_text() {
        let levels = vec![ApprovalLevelInput {
            id: None,
            rank: RankInput::Text("abc".into()),
            approver_ids: vec![],
        }];
        assert!(matches!(
            validate_levels(&levels),
            Err(ApprovalError::InvalidRank(_))
        ));
    }
}
