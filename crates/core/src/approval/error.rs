//! Approval configuration error types.
//!
//! Every variant is a client-side problem with the submitted configuration
//! or a business rule violation, so all of them map to HTTP 422.

use thiserror::Error;
use uuid::Uuid;

use staffdesk_shared::AppError;

/// Errors raised while validating approval configurations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    /// The configuration has no approval levels.
    #[error("At least one approval is required")]
    ApprovalRequired,

    /// A rank value is not a positive integer.
    #[error("Invalid rank value: {0}")]
    InvalidRank(String),

    /// Two levels share the same rank.
    #[error("Approval rank {0} is used more than once")]
    DuplicateRank(u32),

    /// Ranks are not exactly 1..N.
    #[error("Approval rank order is invalid")]
    RankOrderInvalid,

    /// A level would be left without any approver.
    #[error("Approval level with rank {0} must have at least one approver")]
    LevelWithoutApprover(u32),

    /// A referenced approval level does not belong to the configuration.
    #[error("Approval level {0} does not belong to this configuration")]
    UnknownApprovalLevel(Uuid),

    /// A referenced approver assignment does not belong to the configuration.
    #[error("Approval user {0} does not belong to this configuration")]
    UnknownApprovalUser(Uuid),

    /// An approver is not an active internal employee.
    #[error("Approver {0} must be an active internal employee")]
    InvalidApprover(Uuid),
}

impl ApprovalError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        422
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ApprovalRequired => "APPROVAL_REQUIRED",
            Self::InvalidRank(_) => "INVALID_RANK",
            Self::DuplicateRank(_) => "DUPLICATE_RANK",
            Self::RankOrderInvalid => "RANK_ORDER_INVALID",
            Self::LevelWithoutApprover(_) => "LEVEL_WITHOUT_APPROVER",
            Self::UnknownApprovalLevel(_) => "UNKNOWN_APPROVAL_LEVEL",
            Self::UnknownApprovalUser(_) => "UNKNOWN_APPROVAL_USER",
            Self::InvalidApprover(_) => "INVALID_APPROVER",
        }
    }
}

impl From<ApprovalError> for AppError {
    fn from(err: ApprovalError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_variants_are_unprocessable() {
        let errors = [
            ApprovalError::ApprovalRequired,
            ApprovalError::InvalidRank("one".into()),
            ApprovalError::DuplicateRank(1),
            ApprovalError::RankOrderInvalid,
            ApprovalError::LevelWithoutApprover(2),
            ApprovalError::UnknownApprovalLevel(Uuid::nil()),
            ApprovalError::UnknownApprovalUser(Uuid::nil()),
            ApprovalError::InvalidApprover(Uuid::nil()),
        ];
        for err in errors {
            assert_eq!(err.status_code(), 422);
            assert_eq!(AppError::from(err).status_code(), 422);
        }
    }

    #[test]
    fn test_rank_errors_have_distinct_codes() {
        assert_eq!(ApprovalError::DuplicateRank(1).error_code(), "DUPLICATE_RANK");
        assert_eq!(
            ApprovalError::RankOrderInvalid.error_code(),
            "RANK_ORDER_INVALID"
        );
        assert_eq!(
            ApprovalError::RankOrderInvalid.to_string(),
            "Approval rank order is invalid"
        );
    }
}
