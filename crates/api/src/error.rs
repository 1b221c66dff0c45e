//! API error type rendered as the response envelope.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use tracing::error;
use validator::{ValidationErrors, ValidationErrorsKind};

use staffdesk_core::CoreError;
use staffdesk_core::validation::ValidationError;
use staffdesk_db::RepoError;
use staffdesk_shared::AppError;

use crate::response::{Envelope, ErrorBody};

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An error ready to be sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    code: String,
    message: String,
    field: Option<String>,
}

impl ApiError {
    /// Creates an error with an explicit status and code.
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            field: None,
        }
    }

    /// Attaches the offending request field.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// 404 with a resource-specific code.
    pub fn not_found(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Offending field.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        Envelope::failure(
            self.status,
            self.message,
            ErrorBody {
                code: self.code,
                field: self.field,
            },
        )
        .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %err, "request failed");
        }
        Self::new(status, err.error_code(), err.public_message())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::UNPROCESSABLE_ENTITY);
        Self {
            status,
            code: err.error_code().to_string(),
            message: err.to_string(),
            field: err.field().map(str::to_string),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        CoreError::from(err).into()
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            other => AppError::from(other).into(),
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        AppError::Database(err.to_string()).into()
    }
}

fn first_field_error(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields.into_iter().find_map(|(name, kind)| {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => list.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map_or_else(|| format!("{path} is invalid"), ToString::to_string);
                (path.clone(), message)
            }),
            ValidationErrorsKind::Struct(inner) => first_field_error(inner, &path),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(index, inner)| first_field_error(inner, &format!("{path}[{index}]"))),
        }
    })
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let (field, message) = first_field_error(&errors, "")
            .unwrap_or_else(|| (String::new(), "Request is invalid".to_string()));
        let err = Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message);
        if field.is_empty() { err } else { err.with_field(field) }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_PAYLOAD",
            rejection.body_text(),
        )
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_QUERY",
            rejection.body_text(),
        )
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staffdesk_core::approval::ApprovalError;
    use staffdesk_core::employee::EmployeeError;
    use validator::Validate;

    #[test]
    fn test_domain_codes_survive_repository_errors() {
        let err: ApiError = RepoError::from(ApprovalError::DuplicateRank(2)).into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "DUPLICATE_RANK");

        let err: ApiError =
            RepoError::from(EmployeeError::SoleApprover("This user is the only approver for CLI-0001".into()))
                .into();
        assert_eq!(err.code(), "SOLE_APPROVER");
        assert_eq!(err.message(), "This user is the only approver for CLI-0001");
    }

    #[test]
    fn test_conflict_and_database_errors() {
        let err: ApiError = RepoError::Conflict("Email 'a@b.c' is already in use".into()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = DbErr::Custom("connection reset".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "DATABASE_ERROR");
        assert!(!err.message().contains("connection reset"));
    }

    #[derive(Debug, Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
        #[validate(email(message = "email must be valid"))]
        email: String,
    }

    #[test]
    fn test_first_validator_error_in_field_order() {
        let payload = Payload {
            name: String::new(),
            email: "nope".into(),
        };
        let err: ApiError = payload.validate().unwrap_err().into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.field(), Some("email"));
        assert_eq!(err.message(), "email must be valid");
    }
}
