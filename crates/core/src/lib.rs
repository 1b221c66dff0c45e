//! Core business logic for StaffDesk.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `approval` - Approval rank ordering, configuration planning, sole-approver guard
//! - `validation` - Ordered validation pipeline with an explicit context
//! - `employee` - Offboarding, rejoin and document rules
//! - `company` - Client, vendor and end-client rules
//! - `placement` - Placement rules, timesheet approval source, billing timeline
//! - `reference` - Human-readable reference ids

pub mod approval;
pub mod company;
pub mod employee;
pub mod placement;
pub mod reference;
pub mod validation;

use thiserror::Error;

use staffdesk_shared::AppError;

/// Any domain rule failure, keeping the domain error code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Approval configuration error.
    #[error(transparent)]
    Approval(#[from] approval::ApprovalError),
    /// Employee lifecycle error.
    #[error(transparent)]
    Employee(#[from] employee::EmployeeError),
    /// Company rule error.
    #[error(transparent)]
    Company(#[from] company::CompanyError),
    /// Placement rule error.
    #[error(transparent)]
    Placement(#[from] placement::PlacementError),
    /// Billing rule error.
    #[error(transparent)]
    Billing(#[from] placement::BillingError),
    /// Field validation error.
    #[error(transparent)]
    Validation(#[from] validation::ValidationError),
}

impl CoreError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Approval(e) => e.status_code(),
            Self::Employee(e) => e.status_code(),
            Self::Company(e) => e.status_code(),
            Self::Placement(e) => e.status_code(),
            Self::Billing(_) | Self::Validation(_) => 422,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Approval(e) => e.error_code(),
            Self::Employee(e) => e.error_code(),
            Self::Company(e) => e.error_code(),
            Self::Placement(e) => e.error_code(),
            Self::Billing(e) => e.error_code(),
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// Request field the error refers to, if known.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation(e) => e.field.as_deref(),
            Self::Billing(placement::BillingError::NonPositiveRate { field }) => Some(field),
            Self::Approval(approval::ApprovalError::InvalidRank(_)) => Some("rank"),
            _ => None,
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Approval(e) => e.into(),
            CoreError::Employee(e) => e.into(),
            CoreError::Company(e) => e.into(),
            CoreError::Placement(e) => e.into(),
            CoreError::Billing(e) => e.into(),
            CoreError::Validation(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_code_is_kept() {
        let err: CoreError = approval::ApprovalError::DuplicateRank(2).into();
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "DUPLICATE_RANK");
        assert_eq!(err.to_string(), "Approval rank 2 is used more than once");
    }

    #[test]
    fn test_not_found_status_survives() {
        let err: CoreError = company::CompanyError::NotFound(uuid::Uuid::nil()).into();
        assert_eq!(err.status_code(), 404);
        assert_eq!(AppError::from(err).status_code(), 404);
    }
}
