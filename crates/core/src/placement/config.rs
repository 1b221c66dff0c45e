//! Resolution of a placement's timesheet approval setting.

use uuid::Uuid;

use crate::approval::{ApprovalConfigType, ApprovalLevelInput, NewLevel, plan_create};
use crate::placement::error::PlacementError;

/// Where a placement's timesheet approvals come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimesheetApprovalSource {
    /// Point at an existing setting (tenant default or client's).
    Shared(Uuid),
    /// Create a placement-owned setting with these levels.
    Custom(Vec<NewLevel>),
}

/// Settings a placement may reuse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailableSettings {
    /// Client company's timesheet setting.
    pub client_timesheet: Option<Uuid>,
    /// Tenant-global timesheet setting.
    pub global_timesheet: Option<Uuid>,
}

/// Resolves the timesheet approval source for a config type.
///
/// Only custom configurations go through the rank check; the shared ones
/// were validated when stored.
///
/// # Errors
///
/// `GlobalConfigMissing` / `ClientConfigMissing` when the setting to reuse
/// does not exist, `CustomApprovalsRequired` for an empty custom config,
/// and approval errors from the rank check.
pub fn resolve_timesheet_config(
    config_type: ApprovalConfigType,
    available: AvailableSettings,
    approvals: &[ApprovalLevelInput],
) -> Result<TimesheetApprovalSource, crate::CoreError> {
    match config_type {
        ApprovalConfigType::TenantDefault => available
            .global_timesheet
            .map(TimesheetApprovalSource::Shared)
            .ok_or_else(|| PlacementError::GlobalConfigMissing.into()),
        ApprovalConfigType::InheritClient => available
            .client_timesheet
            .map(TimesheetApprovalSource::Shared)
            .ok_or_else(|| PlacementError::ClientConfigMissing.into()),
        ApprovalConfigType::Custom => {
            if approvals.is_empty() {
                return Err(PlacementError::CustomApprovalsRequired.into());
            }
            Ok(TimesheetApprovalSource::Custom(plan_create(approvals)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;
    use crate::approval::ApprovalError;

    #[test]
    fn test_tenant_default_requires_global() {
        let err = resolve_timesheet_config(
            ApprovalConfigType::TenantDefault,
            AvailableSettings::default(),
            &[],
        )
        .unwrap_err();
        assert_eq!(err, CoreError::Placement(PlacementError::GlobalConfigMissing));

        let global = Uuid::new_v4();
        let source = resolve_timesheet_config(
            ApprovalConfigType::TenantDefault,
            AvailableSettings {
                global_timesheet: Some(global),
                ..AvailableSettings::default()
            },
            &[],
        )
        .unwrap();
        assert_eq!(source, TimesheetApprovalSource::Shared(global));
    }

    #[test]
    fn test_inherit_client_requires_client_setting() {
        let err = resolve_timesheet_config(
            ApprovalConfigType::InheritClient,
            AvailableSettings::default(),
            &[],
        )
        .unwrap_err();
        assert_eq!(err, CoreError::Placement(PlacementError::ClientConfigMissing));
    }

    #[test]
    fn test_shared_setting_skips_rank_check() {
        let client = Uuid::new_v4();
        let bad = vec![ApprovalLevelInput::new(5, vec![Uuid::new_v4()])];
        let source = resolve_timesheet_config(
            ApprovalConfigType::InheritClient,
            AvailableSettings {
                client_timesheet: Some(client),
                global_timesheet: None,
            },
            &bad,
        )
        .unwrap();
        assert_eq!(source, TimesheetApprovalSource::Shared(client));
    }

    #[test]
    fn test_custom_runs_rank_check() {
        let bad = vec![
            ApprovalLevelInput::new(1, vec![Uuid::new_v4()]),
            ApprovalLevelInput::new(3, vec![Uuid::new_v4()]),
        ];
        let err = resolve_timesheet_config(
            ApprovalConfigType::Custom,
            AvailableSettings::default(),
            &bad,
        )
        .unwrap_err();
        assert_eq!(err, CoreError::Approval(ApprovalError::RankOrderInvalid));
    }

    #[test]
    fn test_custom_without_approvals() {
        let err =
            resolve_timesheet_config(ApprovalConfigType::Custom, AvailableSettings::default(), &[])
                .unwrap_err();
        assert_eq!(
            err,
            CoreError::Placement(PlacementError::CustomApprovalsRequired)
        );
    }
}
