//! Employee lifecycle error types.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use staffdesk_shared::AppError;

/// Errors that can occur during onboarding, offboarding, rejoin and
/// document management.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmployeeError {
    /// Employee does not exist in the tenant.
    #[error("Employee {0} not found")]
    NotFound(Uuid),

    /// The tenant owner can never be deactivated.
    #[error("Action not allowed for the account owner")]
    ActionNotAllowed,

    /// Employee is already inactive.
    #[error("Employee is already inactive")]
    AlreadyInactive,

    /// Only inactive employees can rejoin.
    #[error("Employee is still active")]
    StillActive,

    /// Relieving date precedes the joining date.
    #[error("Relieving date {relieving} cannot be before joining date {joining}")]
    RelievingBeforeJoining {
        /// Requested relieving date.
        relieving: NaiveDate,
        /// Current joining date.
        joining: NaiveDate,
    },

    /// Rejoin date is not after the last relieving date.
    #[error("Rejoin date {rejoin} must be after relieving date {relieving}")]
    RejoinBeforeRelieving {
        /// Requested rejoin date.
        rejoin: NaiveDate,
        /// Last relieving date.
        relieving: NaiveDate,
    },

    /// Employee is the sole approver on at least one approval level.
    #[error("{0}")]
    SoleApprover(String),

    /// Document expiry is not after its issue date.
    #[error("Document expiry date must be after the issue date")]
    DocumentExpiryBeforeIssue,

    /// Visa documents need a visa type.
    #[error("Visa type is required for visa documents")]
    VisaTypeRequired,

    /// Document not found.
    #[error("Document {0} not found")]
    DocumentNotFound(Uuid),
}

impl EmployeeError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::DocumentNotFound(_) => 404,
            _ => 422,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "EMPLOYEE_NOT_FOUND",
            Self::ActionNotAllowed => "ACTION_NOT_ALLOWED",
            Self::AlreadyInactive => "ALREADY_INACTIVE",
            Self::StillActive => "STILL_ACTIVE",
            Self::RelievingBeforeJoining { .. } => "RELIEVING_BEFORE_JOINING",
            Self::RejoinBeforeRelieving { .. } => "REJOIN_BEFORE_RELIEVING",
            Self::SoleApprover(_) => "SOLE_APPROVER",
            Self::DocumentExpiryBeforeIssue => "DOCUMENT_EXPIRY_BEFORE_ISSUE",
            Self::VisaTypeRequired => "VISA_TYPE_REQUIRED",
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
        }
    }
}

impl From<EmployeeError> for AppError {
    fn from(err: EmployeeError) -> Self {
        match err {
            EmployeeError::NotFound(_) | EmployeeError::DocumentNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            EmployeeError::DocumentExpiryBeforeIssue | EmployeeError::VisaTypeRequired => {
                Self::Validation(err.to_string())
            }
            _ => Self::BusinessRule(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = EmployeeError::NotFound(Uuid::nil());
        assert_eq!(err.status_code(), 404);
        assert_eq!(AppError::from(err).status_code(), 404);
    }

    #[test]
    fn test_sole_approver_message_is_passed_through() {
        let err = EmployeeError::SoleApprover("This user is the only approver for CLI-0001".into());
        assert_eq!(err.error_code(), "SOLE_APPROVER");
        let app: AppError = err.into();
        assert!(matches!(app, AppError::BusinessRule(ref m) if m.ends_with("CLI-0001")));
    }

    #[test]
    fn test_owner_is_business_rule() {
        let app: AppError = EmployeeError::ActionNotAllowed.into();
        assert_eq!(app.error_code(), "BUSINESS_RULE_VIOLATION");
    }
}
