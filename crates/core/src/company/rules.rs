//! Company rules shared by create, update and delete.

use uuid::Uuid;

use crate::company::error::CompanyError;
use crate::company::types::{CompanyType, TimesheetCycle};

/// Checks that a company referenced by an operation has the expected type.
///
/// # Errors
///
/// Returns `WrongType` on mismatch.
pub fn ensure_type(id: Uuid, actual: CompanyType, expected: CompanyType) -> Result<(), CompanyError> {
    if actual == expected {
        Ok(())
    } else {
        Err(CompanyError::WrongType { id, expected })
    }
}

/// Checks that a company may own approval configurations.
///
/// # Errors
///
/// Returns `ApprovalConfigNotAllowed` for non-clients.
pub fn ensure_client_config(company_type: CompanyType) -> Result<(), CompanyError> {
    if company_type == CompanyType::Client {
        Ok(())
    } else {
        Err(CompanyError::ApprovalConfigNotAllowed)
    }
}

/// Validates a timesheet configuration request for a company.
///
/// Returns the cycle to store.
///
/// # Errors
///
/// `ApprovalConfigNotAllowed` for non-clients, `TimesheetCycleRequired`
/// when a client submits no cycle.
pub fn validate_timesheet_config(
    company_type: CompanyType,
    cycle: Option<TimesheetCycle>,
) -> Result<TimesheetCycle, CompanyError> {
    ensure_client_config(company_type)?;
    cycle.ok_or(CompanyError::TimesheetCycleRequired)
}

/// Checks that a company can be soft-deleted.
///
/// # Errors
///
/// Returns `MappedToPlacements` while active placements reference it.
pub const fn ensure_deletable(active_placements: u64) -> Result<(), CompanyError> {
    if active_placements > 0 {
        return Err(CompanyError::MappedToPlacements(active_placements));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use staffdesk_shared::AppError;

    #[test]
    fn test_ensure_type() {
        let id = Uuid::new_v4();
        assert!(ensure_type(id, CompanyType::Client, CompanyType::Client).is_ok());
        assert_eq!(
            ensure_type(id, CompanyType::Vendor, CompanyType::Client).unwrap_err(),
            CompanyError::WrongType {
                id,
                expected: CompanyType::Client
            }
        );
    }

    #[test]
    fn test_timesheet_config_only_for_clients() {
        assert_eq!(
            validate_timesheet_config(CompanyType::Vendor, Some(TimesheetCycle::Weekly)),
            Err(CompanyError::ApprovalConfigNotAllowed)
        );
        assert_eq!(
            validate_timesheet_config(CompanyType::Client, None),
            Err(CompanyError::TimesheetCycleRequired)
        );
        assert_eq!(
            validate_timesheet_config(CompanyType::Client, Some(TimesheetCycle::Monthly)),
            Ok(TimesheetCycle::Monthly)
        );
    }

    #[test]
    fn test_invoice_config_only_for_clients() {
        assert!(ensure_client_config(CompanyType::Client).is_ok());
        assert_eq!(
            ensure_client_config(CompanyType::EndClient),
            Err(CompanyError::ApprovalConfigNotAllowed)
        );
    }

    #[test]
    fn test_delete_blocked_by_active_placements() {
        assert!(ensure_deletable(0).is_ok());
        let err = ensure_deletable(3).unwrap_err();
        assert_eq!(err.to_string(), "company is mapped to 3 active placements");
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 422);
    }
}
