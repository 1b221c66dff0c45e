//! Repository error type.

use sea_orm::DbErr;

use staffdesk_core::CoreError;
use staffdesk_core::approval::ApprovalError;
use staffdesk_core::company::CompanyError;
use staffdesk_core::employee::EmployeeError;
use staffdesk_core::placement::{BillingError, PlacementError};
use staffdesk_shared::AppError;

/// Error types for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Unique value already taken (email, document number).
    #[error("{0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

macro_rules! domain_error {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for RepoError {
                fn from(err: $ty) -> Self {
                    Self::Domain(err.into())
                }
            }
        )*
    };
}

domain_error!(ApprovalError, EmployeeError, CompanyError, PlacementError, BillingError);

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::Conflict(msg) => Self::Conflict(msg),
            RepoError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_keep_status() {
        let err: RepoError = CompanyError::MappedToPlacements(2).into();
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 422);
        assert!(app.to_string().contains("company is mapped to 2 active placements"));
    }

    #[test]
    fn test_database_error_is_internal() {
        let err: RepoError = DbErr::Custom("boom".into()).into();
        assert_eq!(AppError::from(err).status_code(), 500);
    }
}
