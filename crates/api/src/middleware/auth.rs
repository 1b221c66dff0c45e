//! Bearer-token authentication for tenant-scoped routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use staffdesk_shared::{Claims, JwtError};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

fn unauthorized(code: &str, message: &str) -> ApiError {
    ApiError::new(StatusCode::UNAUTHORIZED, code, message)
}

/// Validates the bearer token and stores its claims in request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token);

    let Some(token) = token else {
        return unauthorized(
            "MISSING_TOKEN",
            "Authorization header with Bearer token is required",
        )
        .into_response();
    };

    match state.jwt_service.verify(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            debug!(error = %e, "rejected bearer token");
            match e {
                JwtError::Expired => unauthorized("TOKEN_EXPIRED", "Token has expired"),
                _ => unauthorized("INVALID_TOKEN", "Invalid or malformed token"),
            }
            .into_response()
        }
    }
}

/// Authenticated employee and tenant of the request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Authenticated employee.
    #[must_use]
    pub fn employee_id(&self) -> Uuid {
        self.0.employee_id()
    }

    /// Tenant every query is scoped to.
    #[must_use]
    pub fn tenant_id(&self) -> Uuid {
        self.0.tenant_id()
    }

    /// Role claim.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.0.role
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| unauthorized("UNAUTHORIZED", "Authentication required"))
    }
}
