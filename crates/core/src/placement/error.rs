//! Placement and billing error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use staffdesk_shared::AppError;

/// Errors from placement rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// Placement does not exist in the tenant.
    #[error("Placement {0} not found")]
    NotFound(Uuid),

    /// Only active employees can be placed.
    #[error("Employee {0} is not active")]
    EmployeeInactive(Uuid),

    /// End date precedes the start date.
    #[error("End date {end} cannot be before start date {start}")]
    EndBeforeStart {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Inherit-client config type, but the client has no timesheet approvals.
    #[error("Client has no timesheet approval configuration to inherit")]
    ClientConfigMissing,

    /// Tenant-default config type, but no global timesheet approvals exist.
    #[error("No global timesheet approval configuration exists")]
    GlobalConfigMissing,

    /// Custom config type submitted without approvals.
    #[error("Approvals are required for a custom timesheet configuration")]
    CustomApprovalsRequired,
}

impl PlacementError {
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
            Self::NotFound(_) => "PLACEMENT_NOT_FOUND",
            Self::EmployeeInactive(_) => "EMPLOYEE_INACTIVE",
            Self::EndBeforeStart { .. } => "END_BEFORE_START",
            Self::ClientConfigMissing => "CLIENT_CONFIG_MISSING",
            Self::GlobalConfigMissing => "GLOBAL_CONFIG_MISSING",
            Self::CustomApprovalsRequired => "APPROVAL_REQUIRED",
        }
    }
}

impl From<PlacementError> for AppError {
    fn from(err: PlacementError) -> Self {
        match err {
            PlacementError::NotFound(_) => Self::NotFound(err.to_string()),
            PlacementError::EndBeforeStart { .. } | PlacementError::CustomApprovalsRequired => {
                Self::Validation(err.to_string())
            }
            _ => Self::BusinessRule(err.to_string()),
        }
    }
}

/// Errors from billing rate rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    /// Bill or pay rate is zero or negative.
    #[error("{field} must be greater than zero")]
    NonPositiveRate {
        /// Offending field.
        field: &'static str,
    },

    /// Overtime bill rate is negative.
    #[error("overtime_bill_rate cannot be negative")]
    NegativeOvertimeRate,

    /// Pay rate above bill rate.
    #[error("Pay rate {pay} cannot exceed bill rate {bill}")]
    PayExceedsBill {
        /// Pay rate.
        pay: Decimal,
        /// Bill rate.
        bill: Decimal,
    },

    /// Effective date before the placement started.
    #[error("Effective date {effective_from} is before placement start {start}")]
    BeforePlacementStart {
        /// Requested effective date.
        effective_from: NaiveDate,
        /// Placement start date.
        start: NaiveDate,
    },

    /// Effective date after the placement ended.
    #[error("Effective date {effective_from} is after placement end {end}")]
    AfterPlacementEnd {
        /// Requested effective date.
        effective_from: NaiveDate,
        /// Placement end date.
        end: NaiveDate,
    },

    /// Effective date not after the latest existing billing.
    #[error("Effective date must be after {latest}")]
    NotAfterLatest {
        /// Latest existing effective date.
        latest: NaiveDate,
    },
}

impl BillingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveRate { .. } | Self::NegativeOvertimeRate => "INVALID_RATE",
            Self::PayExceedsBill { .. } => "PAY_EXCEEDS_BILL",
            Self::BeforePlacementStart { .. } | Self::AfterPlacementEnd { .. } => {
                "OUTSIDE_PLACEMENT"
            }
            Self::NotAfterLatest { .. } => "BILLING_OVERLAP",
        }
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        Self::Validation(err.to_string())
    }
}
