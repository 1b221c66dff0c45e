//! Offboarding and rejoin rules.

use chrono::NaiveDate;

use staffdesk_shared::types::ApprovalUserId;

use crate::approval::{ApproverMembership, GuardDecision, SoleApproverGuard};
use crate::employee::error::EmployeeError;
use crate::employee::types::{EmployeeSnapshot, EmployeeStatus};

/// Checks the unconditional deactivation preconditions.
///
/// # Errors
///
/// `NotFound` when the employee is missing, `ActionNotAllowed` for the
/// tenant owner, `AlreadyInactive` when already offboarded.
pub fn ensure_can_deactivate(
    employee: Option<&EmployeeSnapshot>,
    id: uuid::Uuid,
) -> Result<&EmployeeSnapshot, EmployeeError> {
    let employee = employee.ok_or(EmployeeError::NotFound(id))?;
    if employee.is_tenant_owner {
        return Err(EmployeeError::ActionNotAllowed);
    }
    if employee.status == EmployeeStatus::Inactive {
        return Err(EmployeeError::AlreadyInactive);
    }
    Ok(employee)
}

/// Validates the relieving date of an offboarding request.
///
/// # Errors
///
/// Returns `RelievingBeforeJoining` when `relieving_date` precedes the
/// current joining date.
pub fn validate_offboarding(
    employee: &EmployeeSnapshot,
    relieving_date: NaiveDate,
) -> Result<(), EmployeeError> {
    if relieving_date < employee.joining_date {
        return Err(EmployeeError::RelievingBeforeJoining {
            relieving: relieving_date,
            joining: employee.joining_date,
        });
    }
    Ok(())
}

/// Runs the sole-approver guard for an employee and returns the approver
/// assignments to release.
///
/// Employees the guard does not apply to release nothing.
///
/// # Errors
///
/// Returns `SoleApprover` with the rejection message when blocked.
pub fn approver_release(
    employee: &EmployeeSnapshot,
    memberships: &[ApproverMembership],
) -> Result<Vec<ApprovalUserId>, EmployeeError> {
    if !SoleApproverGuard::applies_to(employee.employment_type) {
        return Ok(Vec::new());
    }
    match SoleApproverGuard::evaluate(memberships) {
        GuardDecision::Allowed { release } => Ok(release),
        blocked @ GuardDecision::Blocked { .. } => Err(EmployeeError::SoleApprover(
            blocked.message().unwrap_or_default(),
        )),
    }
}

/// Validates a rejoin request.
///
/// # Errors
///
/// `StillActive` for active employees, `RejoinBeforeRelieving` when the
/// new joining date is not after the last relieving date.
pub fn validate_rejoin(
    employee: &EmployeeSnapshot,
    joining_date: NaiveDate,
) -> Result<(), EmployeeError> {
    if employee.status == EmployeeStatus::Active {
        return Err(EmployeeError::StillActive);
    }
    if let Some(relieving) = employee.relieving_date
        && joining_date <= relieving
    {
        return Err(EmployeeError::RejoinBeforeRelieving {
            rejoin: joining_date,
            relieving,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::OwnerReferences;
    use crate::employee::types::EmploymentType;
    use staffdesk_shared::types::ApprovalLevelId;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn employee(employment_type: EmploymentType) -> EmployeeSnapshot {
        EmployeeSnapshot {
            id: Uuid::new_v4(),
            employment_type,
            status: EmployeeStatus::Active,
            is_tenant_owner: false,
            joining_date: date(2024, 1, 15),
            relieving_date: None,
        }
    }

    fn sole_membership(reference: &str) -> ApproverMembership {
        ApproverMembership {
            approval_user_id: ApprovalUserId::new(),
            approval_level_id: ApprovalLevelId::new(),
            num_approval_users: 1,
            is_approver: true,
            owners: OwnerReferences {
                client_timesheet_ref: Some(reference.to_string()),
                ..OwnerReferences::default()
            },
        }
    }

    #[test]
    fn test_missing_employee_is_not_found() {
        let id = Uuid::new_v4();
        assert_eq!(
            ensure_can_deactivate(None, id).unwrap_err(),
            EmployeeError::NotFound(id)
        );
    }

    #[test]
    fn test_owner_cannot_be_deactivated() {
        let mut owner = employee(EmploymentType::Internal);
        owner.is_tenant_owner = true;
        assert_eq!(
            ensure_can_deactivate(Some(&owner), owner.id).unwrap_err(),
            EmployeeError::ActionNotAllowed
        );
    }

    #[test]
    fn test_inactive_cannot_be_deactivated_again() {
        let mut e = employee(EmploymentType::Internal);
        e.status = EmployeeStatus::Inactive;
        assert_eq!(
            ensure_can_deactivate(Some(&e), e.id).unwrap_err(),
            EmployeeError::AlreadyInactive
        );
    }

    #[test]
    fn test_relieving_before_joining_rejected() {
        let e = employee(EmploymentType::Internal);
        assert!(validate_offboarding(&e, date(2024, 1, 14)).is_err());
        assert!(validate_offboarding(&e, date(2024, 1, 15)).is_ok());
    }

    #[test]
    fn test_consultant_skips_guard() {
        let e = employee(EmploymentType::Consultant);
        let release = approver_release(&e, &[sole_membership("CLI-0001")]).unwrap();
        assert!(release.is_empty());
    }

    #[test]
    fn test_internal_sole_approver_blocked() {
        let e = employee(EmploymentType::Internal);
        let err = approver_release(&e, &[sole_membership("CLI-0007")]).unwrap_err();
        assert_eq!(
            err,
            EmployeeError::SoleApprover("This user is the only approver for CLI-0007".into())
        );
    }

    #[test]
    fn test_internal_shared_approver_released() {
        let e = employee(EmploymentType::Internal);
        let mut shared = sole_membership("CLI-0002");
        shared.num_approval_users = 2;
        let release = approver_release(&e, std::slice::from_ref(&shared)).unwrap();
        assert_eq!(release, vec![shared.approval_user_id]);
    }

    #[test]
    fn test_rejoin_rules() {
        let mut e = employee(EmploymentType::Consultant);
        assert_eq!(
            validate_rejoin(&e, date(2025, 1, 1)).unwrap_err(),
            EmployeeError::StillActive
        );

        e.status = EmployeeStatus::Inactive;
        e.relieving_date = Some(date(2024, 6, 30));
        assert!(validate_rejoin(&e, date(2024, 6, 30)).is_err());
        assert!(validate_rejoin(&e, date(2024, 7, 1)).is_ok());
    }
}
