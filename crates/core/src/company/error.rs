//! Company error types.

use thiserror::Error;
use uuid::Uuid;

use staffdesk_shared::AppError;

use crate::company::types::CompanyType;

/// Errors from company rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompanyError {
    /// Company does not exist in the tenant.
    #[error("Company {0} not found")]
    NotFound(Uuid),

    /// Company has a different type than the operation needs.
    #[error("Company {id} must be a {expected} company")]
    WrongType {
        /// Company ID.
        id: Uuid,
        /// Required type.
        expected: CompanyType,
    },

    /// Only clients carry a timesheet cycle and approval configurations.
    #[error("Approval configuration is only available for clients")]
    ApprovalConfigNotAllowed,

    /// Timesheet cycle missing on a client timesheet configuration.
    #[error("Timesheet cycle is required")]
    TimesheetCycleRequired,

    /// Company is still referenced by active placements.
    #[error("company is mapped to {0} active placements")]
    MappedToPlacements(u64),

    /// Company is inactive.
    #[error("Company {0} is inactive")]
    Inactive(Uuid),
}

impl CompanyError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            _ => 422,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "COMPANY_NOT_FOUND",
            Self::WrongType { .. } => "COMPANY_WRONG_TYPE",
            Self::ApprovalConfigNotAllowed => "APPROVAL_CONFIG_NOT_ALLOWED",
            Self::TimesheetCycleRequired => "TIMESHEET_CYCLE_REQUIRED",
            Self::MappedToPlacements(_) => "COMPANY_MAPPED_TO_PLACEMENTS",
            Self::Inactive(_) => "COMPANY_INACTIVE",
        }
    }
}

impl From<CompanyError> for AppError {
    fn from(err: CompanyError) -> Self {
        match err {
            CompanyError::NotFound(_) => Self::NotFound(err.to_string()),
            CompanyError::MappedToPlacements(_) | CompanyError::Inactive(_) => {
                Self::BusinessRule(err.to_string())
            }
            _ => Self::Validation(err.to_string()),
        }
    }
}
