//! Approval configuration payload and its ordered checks.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use staffdesk_core::CoreError;
use staffdesk_core::approval::{
    ApprovalConfigInput, ApprovalError, ApprovalLevelInput, validate_levels,
};
use staffdesk_core::validation::{Pipeline, ValidationError};

/// Approval levels plus deletions, as submitted by clients.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ApprovalConfigRequest {
    /// Levels to create or edit.
    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 approval levels are allowed"))]
    pub approvals: Vec<ApprovalLevelInput>,
    /// Approver assignments to remove.
    #[serde(default)]
    pub delete_user_ids: Vec<Uuid>,
    /// Levels to remove.
    #[serde(default)]
    pub delete_approval_level_ids: Vec<Uuid>,
}

impl From<ApprovalConfigRequest> for ApprovalConfigInput {
    fn from(request: ApprovalConfigRequest) -> Self {
        Self {
            approvals: request.approvals,
            delete_user_ids: request.delete_user_ids,
            delete_approval_level_ids: request.delete_approval_level_ids,
        }
    }
}

/// Ranks parsed by the pipeline, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalContext {
    /// Parsed ranks.
    pub ranks: Vec<u32>,
}

/// Checks for an approval configuration payload.
///
/// With `required` the payload is a complete configuration: it must have
/// levels and their ranks must be exactly 1..N. Without it the payload is
/// merged into stored levels, so ranks are only checked after the merge.
pub fn approval_pipeline<'a>(
    required: bool,
) -> Pipeline<'a, ApprovalConfigRequest, ApprovalContext, CoreError> {
    Pipeline::<'a, ApprovalConfigRequest, ApprovalContext, CoreError>::new()
        .check("approval_required", move |req: &ApprovalConfigRequest| {
            if required && req.approvals.is_empty() {
                return Err(ApprovalError::ApprovalRequired.into());
            }
            Ok(())
        })
        .check("approver_ids", |req| {
            let missing = req
                .approvals
                .iter()
                .position(|level| level.id.is_none() && level.approver_ids.is_empty());
            match missing {
                Some(index) => Err(ValidationError::field(
                    format!("approvals[{index}].approver_ids"),
                    "At least one approver is required for a new approval level",
                )
                .into()),
                None => Ok(()),
            }
        })
        .step("rank_order", move |req, ctx| {
            if !required {
                return Ok(ctx);
            }
            Ok(ApprovalContext {
                ranks: validate_levels(&req.approvals)?,
            })
        })
}
