//! Tenant-global approval settings per module.

use axum::{Router, extract::State, routing::get};
use tracing::info;

use staffdesk_core::approval::ApprovalModule;
use staffdesk_db::ApprovalRepository;
use staffdesk_db::repositories::ApprovalConfigView;

use crate::AppState;
use crate::dto::approval::{ApprovalConfigRequest, ApprovalContext, approval_pipeline};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiPath, ValidatedJson};
use crate::middleware::AuthUser;
use crate::response::Envelope;

/// Creates the approval settings routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/approval-settings/global/{module}",
        get(get_global).put(put_global),
    )
}

fn module(segment: &str) -> Result<ApprovalModule, ApiError> {
    ApprovalModule::parse(segment).ok_or_else(|| {
        ApiError::not_found(
            "UNKNOWN_APPROVAL_MODULE",
            format!("Unknown approval module '{segment}'"),
        )
    })
}

/// GET `/approval-settings/global/{module}`
async fn get_global(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(segment): ApiPath<String>,
) -> ApiResult<Envelope<ApprovalConfigView>> {
    let module = module(&segment)?;
    let repo = ApprovalRepository::new((*state.db).clone());
    let view = repo
        .global_config(auth.tenant_id(), module)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(
                "APPROVAL_SETTING_NOT_FOUND",
                format!("No global {module} approval configuration"),
            )
        })?;
    Ok(Envelope::ok("Approval configuration fetched", view))
}

/// PUT `/approval-settings/global/{module}` - Create or merge.
async fn put_global(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(segment): ApiPath<String>,
    ValidatedJson(payload): ValidatedJson<ApprovalConfigRequest>,
) -> ApiResult<Envelope<ApprovalConfigView>> {
    let module = module(&segment)?;
    approval_pipeline(false).run(&payload, ApprovalContext::default())?;

    let repo = ApprovalRepository::new((*state.db).clone());
    let view = repo
        .store_global_config(auth.tenant_id(), module, &payload.into())
        .await?;

    info!(
        tenant_id = %auth.tenant_id(),
        employee_id = %auth.employee_id(),
        %module,
        "Global approval configuration stored via API"
    );
    Ok(Envelope::ok("Approval configuration saved", view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_module_segment() {
        assert_eq!(module("timesheet").unwrap(), ApprovalModule::Timesheet);
        assert_eq!(module("2").unwrap(), ApprovalModule::Invoice);
        let err = module("payroll").unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "UNKNOWN_APPROVAL_MODULE");
    }
}
