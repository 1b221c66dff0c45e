//! Approval setting repository.
//!
//! Approval settings are owned by companies, placements or the tenant
//! (global). The helpers here take any connection so owners can store
//! their configuration inside their own transaction.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
    TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use staffdesk_core::approval::{
    ApprovalConfigInput, ApprovalError, ApprovalModule, ApprovalPlan, ApproverMembership,
    ExistingApprover, ExistingLevel, NewLevel, OwnerReferences, plan_create, plan_update,
    submitted_approver_ids,
};
use staffdesk_core::employee::{EmployeeStatus, EmploymentType};
use staffdesk_shared::types::{ApprovalLevelId, ApprovalUserId};

use crate::entities::{approval_levels, approval_settings, approval_users, employees};
use crate::repositories::error::RepoError;

/// Approver shown in a configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ApproverView {
    /// `approval_users.id`, used for `delete_user_ids`.
    pub approval_user_id: Uuid,
    /// Approving employee.
    pub approver_id: Uuid,
    /// Employee reference id.
    pub reference_id: String,
    /// Employee display name.
    pub name: String,
}

/// Level shown in a configuration.
#[derive(Debug, Clone, Serialize)]
pub struct LevelView {
    /// `approval_levels.id`.
    pub id: Uuid,
    /// Rank, 1-based.
    pub rank: u32,
    /// Active approvers.
    pub approvers: Vec<ApproverView>,
}

/// A stored approval configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalConfigView {
    /// `approval_settings.id`.
    pub id: Uuid,
    /// Governed document.
    pub approval_module: ApprovalModule,
    /// Whether this is the tenant default.
    pub is_global: bool,
    /// Levels ordered by rank.
    pub approvals: Vec<LevelView>,
}

fn rank_to_db(rank: u32) -> Result<i32, DbErr> {
    i32::try_from(rank).map_err(|_| DbErr::Custom(format!("rank {rank} out of range")))
}

fn rank_from_db(rank: i32) -> Result<u32, DbErr> {
    u32::try_from(rank).map_err(|_| DbErr::Custom(format!("stored rank {rank} is negative")))
}

/// Loads the active levels and approvers of a setting, ordered by rank.
///
/// With `lock`, the level rows are locked until the transaction ends.
pub(crate) async fn load_levels<C: ConnectionTrait>(
    conn: &C,
    setting_id: Uuid,
    lock: bool,
) -> Result<Vec<ExistingLevel>, DbErr> {
    let mut query = approval_levels::Entity::find()
        .filter(approval_levels::Column::ApprovalSettingId.eq(setting_id))
        .filter(approval_levels::Column::DeletedAt.is_null())
        .order_by_asc(approval_levels::Column::Rank);
    if lock {
        query = query.lock_exclusive();
    }
    let levels = query.all(conn).await?;

    let level_ids: Vec<Uuid> = levels.iter().map(|l| l.id).collect();
    let users = approval_users::Entity::find()
        .filter(approval_users::Column::ApprovalLevelId.is_in(level_ids))
        .filter(approval_users::Column::DeletedAt.is_null())
        .order_by_asc(approval_users::Column::CreatedAt)
        .all(conn)
        .await?;

    let mut by_level: HashMap<Uuid, Vec<ExistingApprover>> = HashMap::new();
    for user in users {
        by_level
            .entry(user.approval_level_id)
            .or_default()
            .push(ExistingApprover {
                approval_user_id: user.id,
                approver_id: user.approver_id,
            });
    }

    levels
        .into_iter()
        .map(|level| {
            Ok(ExistingLevel {
                id: level.id,
                rank: rank_from_db(level.rank)?,
                approvers: by_level.remove(&level.id).unwrap_or_default(),
            })
        })
        .collect()
}

async fn insert_level<C: ConnectionTrait>(
    conn: &C,
    setting_id: Uuid,
    level: &NewLevel,
) -> Result<(), DbErr> {
    let now = Utc::now().into();
    let level_id = Uuid::now_v7();
    approval_levels::ActiveModel {
        id: Set(level_id),
        approval_setting_id: Set(setting_id),
        rank: Set(rank_to_db(level.rank)?),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
    .insert(conn)
    .await?;

    for approver_id in &level.approver_ids {
        insert_approver(conn, level_id, *approver_id).await?;
    }
    Ok(())
}

async fn insert_approver<C: ConnectionTrait>(
    conn: &C,
    level_id: Uuid,
    approver_id: Uuid,
) -> Result<(), DbErr> {
    let now = Utc::now().into();
    approval_users::ActiveModel {
        id: Set(Uuid::now_v7()),
        approval_level_id: Set(level_id),
        approver_id: Set(approver_id),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Inserts a new setting with its levels.
pub(crate) async fn insert_setting<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    module: ApprovalModule,
    is_global: bool,
    levels: &[NewLevel],
) -> Result<Uuid, DbErr> {
    let now = Utc::now().into();
    let setting_id = Uuid::now_v7();
    approval_settings::ActiveModel {
        id: Set(setting_id),
        tenant_id: Set(tenant_id),
        approval_module: Set(module.id()),
        is_global: Set(is_global),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
    .insert(conn)
    .await?;

    for level in levels {
        insert_level(conn, setting_id, level).await?;
    }
    Ok(setting_id)
}

/// Writes a planned update.
pub(crate) async fn apply_plan<C: ConnectionTrait>(
    conn: &C,
    setting_id: Uuid,
    plan: &ApprovalPlan,
) -> Result<(), DbErr> {
    let now = Utc::now().fixed_offset();

    if !plan.delete_level_ids.is_empty() {
        approval_users::Entity::update_many()
            .col_expr(approval_users::Column::DeletedAt, Expr::value(now))
            .filter(approval_users::Column::ApprovalLevelId.is_in(plan.delete_level_ids.clone()))
            .filter(approval_users::Column::DeletedAt.is_null())
            .exec(conn)
            .await?;
        approval_levels::Entity::update_many()
            .col_expr(approval_levels::Column::DeletedAt, Expr::value(now))
            .filter(approval_levels::Column::Id.is_in(plan.delete_level_ids.clone()))
            .exec(conn)
            .await?;
    }

    if !plan.delete_user_ids.is_empty() {
        approval_users::Entity::update_many()
            .col_expr(approval_users::Column::DeletedAt, Expr::value(now))
            .filter(approval_users::Column::Id.is_in(plan.delete_user_ids.clone()))
            .filter(approval_users::Column::DeletedAt.is_null())
            .exec(conn)
            .await?;
    }

    for (level_id, rank) in &plan.rank_updates {
        approval_levels::Entity::update_many()
            .col_expr(approval_levels::Column::Rank, Expr::value(rank_to_db(*rank)?))
            .filter(approval_levels::Column::Id.eq(*level_id))
            .exec(conn)
            .await?;
    }

    for level in &plan.new_levels {
        insert_level(conn, setting_id, level).await?;
    }
    for (level_id, approver_id) in &plan.new_approvers {
        insert_approver(conn, *level_id, *approver_id).await?;
    }
    Ok(())
}

/// Checks every approver is an active internal employee of the tenant.
///
/// The employee rows are share-locked so a concurrent offboarding waits for
/// this transaction, or this check sees the committed deactivation.
pub(crate) async fn ensure_approvers<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    approver_ids: &[Uuid],
) -> Result<(), RepoError> {
    if approver_ids.is_empty() {
        return Ok(());
    }
    let valid: Vec<Uuid> = employees::Entity::find()
        .select_only()
        .column(employees::Column::Id)
        .filter(employees::Column::Id.is_in(approver_ids.to_vec()))
        .filter(employees::Column::TenantId.eq(tenant_id))
        .filter(employees::Column::DeletedAt.is_null())
        .filter(employees::Column::Status.eq(EmployeeStatus::Active.as_str()))
        .filter(employees::Column::EmploymentTypeId.eq(EmploymentType::Internal.id()))
        .lock_shared()
        .into_tuple()
        .all(conn)
        .await?;

    match approver_ids.iter().find(|id| !valid.contains(id)) {
        Some(invalid) => Err(ApprovalError::InvalidApprover(*invalid).into()),
        None => Ok(()),
    }
}

/// Creates or updates a configuration and returns the setting id.
///
/// Without an existing setting the submission must be a complete
/// configuration; with one it is merged into the stored levels.
pub(crate) async fn store_config<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    existing: Option<Uuid>,
    module: ApprovalModule,
    is_global: bool,
    input: &ApprovalConfigInput,
) -> Result<Uuid, RepoError> {
    match existing {
        Some(setting_id) => {
            let levels = load_levels(conn, setting_id, true).await?;
            let plan = plan_update(&levels, input)?;
            let added: Vec<Uuid> = plan
                .new_levels
                .iter()
                .flat_map(|l| l.approver_ids.iter().copied())
                .chain(plan.new_approvers.iter().map(|(_, approver)| *approver))
                .collect();
            ensure_approvers(conn, tenant_id, &added).await?;
            apply_plan(conn, setting_id, &plan).await?;
            Ok(setting_id)
        }
        None => {
            let levels = plan_create(&input.approvals)?;
            ensure_approvers(conn, tenant_id, &submitted_approver_ids(&input.approvals)).await?;
            Ok(insert_setting(conn, tenant_id, module, is_global, &levels).await?)
        }
    }
}

/// Loads a configuration for display.
pub(crate) async fn config_view<C: ConnectionTrait>(
    conn: &C,
    setting_id: Uuid,
) -> Result<Option<ApprovalConfigView>, DbErr> {
    let Some(setting) = approval_settings::Entity::find_by_id(setting_id)
        .filter(approval_settings::Column::DeletedAt.is_null())
        .one(conn)
        .await?
    else {
        return Ok(None);
    };
    let Some(module) = ApprovalModule::from_id(setting.approval_module) else {
        return Err(DbErr::Custom(format!(
            "unknown approval module {}",
            setting.approval_module
        )));
    };

    let levels = approval_levels::Entity::find()
        .filter(approval_levels::Column::ApprovalSettingId.eq(setting_id))
        .filter(approval_levels::Column::DeletedAt.is_null())
        .order_by_asc(approval_levels::Column::Rank)
        .all(conn)
        .await?;
    let level_ids: Vec<Uuid> = levels.iter().map(|l| l.id).collect();

    let users = approval_users::Entity::find()
        .filter(approval_users::Column::ApprovalLevelId.is_in(level_ids))
        .filter(approval_users::Column::DeletedAt.is_null())
        .order_by_asc(approval_users::Column::CreatedAt)
        .find_also_related(employees::Entity)
        .all(conn)
        .await?;

    let mut by_level: HashMap<Uuid, Vec<ApproverView>> = HashMap::new();
    for (user, employee) in users {
        let (reference_id, name) = employee
            .map(|e| (e.reference_id, format!("{} {}", e.first_name, e.last_name)))
            .unwrap_or_default();
        by_level
            .entry(user.approval_level_id)
            .or_default()
            .push(ApproverView {
                approval_user_id: user.id,
                approver_id: user.approver_id,
                reference_id,
                name,
            });
    }

    let approvals = levels
        .into_iter()
        .map(|level| {
            Ok(LevelView {
                id: level.id,
                rank: rank_from_db(level.rank)?,
                approvers: by_level.remove(&level.id).unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, DbErr>>()?;

    Ok(Some(ApprovalConfigView {
        id: setting.id,
        approval_module: module,
        is_global: setting.is_global,
        approvals,
    }))
}

/// Finds the tenant-global setting for a module.
pub(crate) async fn find_global<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    module: ApprovalModule,
) -> Result<Option<Uuid>, DbErr> {
    approval_settings::Entity::find()
        .select_only()
        .column(approval_settings::Column::Id)
        .filter(approval_settings::Column::TenantId.eq(tenant_id))
        .filter(approval_settings::Column::ApprovalModule.eq(module.id()))
        .filter(approval_settings::Column::IsGlobal.eq(true))
        .filter(approval_settings::Column::DeletedAt.is_null())
        .into_tuple()
        .one(conn)
        .await
}

// Locks every level the employee approves on. The membership query runs as
// a separate statement afterwards so it sees rows committed while waiting.
const LOCK_MEMBERSHIP_LEVELS_SQL: &str = r"
SELECT al.id
FROM approval_levels al
JOIN approval_users au
  ON au.approval_level_id = al.id
 AND au.approver_id = $1
 AND au.deleted_at IS NULL
JOIN approval_settings s ON s.id = al.approval_setting_id
WHERE al.deleted_at IS NULL
  AND s.tenant_id = $2
ORDER BY al.id
FOR UPDATE OF al
";

const APPROVER_MEMBERSHIPS_SQL: &str = r"
SELECT
    au.id AS approval_user_id,
    al.id AS approval_level_id,
    (
        SELECT COUNT(*)
        FROM approval_users other
        WHERE other.approval_level_id = al.id
          AND other.deleted_at IS NULL
    ) AS num_approval_users,
    (au.id IS NOT NULL) AS is_approver,
    ct.reference_id AS client_timesheet_ref,
    ci.reference_id AS client_invoice_ref,
    pt.reference_id AS placement_timesheet_ref,
    pi.reference_id AS placement_invoice_ref,
    CASE WHEN s.is_global THEN s.approval_module END AS global_module
FROM approval_levels al
JOIN approval_settings s
  ON s.id = al.approval_setting_id
 AND s.deleted_at IS NULL
LEFT JOIN approval_users au
  ON au.approval_level_id = al.id
 AND au.approver_id = $1
 AND au.deleted_at IS NULL
LEFT JOIN companies ct
  ON ct.timesheet_approval_id = s.id
 AND ct.deleted_at IS NULL
LEFT JOIN companies ci
  ON ci.invoice_approval_id = s.id
 AND ci.deleted_at IS NULL
LEFT JOIN placements pt
  ON pt.timesheet_approval_id = s.id
 AND pt.timesheet_approval_config_type = 3
 AND pt.deleted_at IS NULL
LEFT JOIN placements pi
  ON pi.invoice_approval_id = s.id
 AND pi.deleted_at IS NULL
WHERE al.deleted_at IS NULL
  AND s.tenant_id = $2
  AND au.id IS NOT NULL
ORDER BY al.approval_setting_id, al.rank, ct.reference_id, ci.reference_id, pt.reference_id, pi.reference_id
";

#[derive(Debug, FromQueryResult)]
struct MembershipRow {
    approval_user_id: Uuid,
    approval_level_id: Uuid,
    num_approval_users: i64,
    is_approver: bool,
    client_timesheet_ref: Option<String>,
    client_invoice_ref: Option<String>,
    placement_timesheet_ref: Option<String>,
    placement_invoice_ref: Option<String>,
    global_module: Option<i16>,
}

impl From<MembershipRow> for ApproverMembership {
    fn from(row: MembershipRow) -> Self {
        Self {
            approval_user_id: ApprovalUserId::from_uuid(row.approval_user_id),
            approval_level_id: ApprovalLevelId::from_uuid(row.approval_level_id),
            num_approval_users: row.num_approval_users,
            is_approver: row.is_approver,
            owners: OwnerReferences {
                client_timesheet_ref: row.client_timesheet_ref,
                client_invoice_ref: row.client_invoice_ref,
                placement_timesheet_ref: row.placement_timesheet_ref,
                placement_invoice_ref: row.placement_invoice_ref,
                global_module: row.global_module.and_then(ApprovalModule::from_id),
            },
        }
    }
}

/// Locks the employee's approval levels and returns their memberships.
///
/// Must run inside a transaction for the locks to hold.
pub(crate) async fn lock_approver_memberships<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    employee_id: Uuid,
) -> Result<Vec<ApproverMembership>, DbErr> {
    conn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        LOCK_MEMBERSHIP_LEVELS_SQL,
        [employee_id.into(), tenant_id.into()],
    ))
    .await?;

    let rows = MembershipRow::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        APPROVER_MEMBERSHIPS_SQL,
        [employee_id.into(), tenant_id.into()],
    ))
    .all(conn)
    .await?;

    Ok(rows.into_iter().map(ApproverMembership::from).collect())
}

/// Soft-deletes approver assignments, leaving their levels untouched.
pub(crate) async fn release_approvers<C: ConnectionTrait>(
    conn: &C,
    ids: &[ApprovalUserId],
) -> Result<u64, DbErr> {
    if ids.is_empty() {
        return Ok(0);
    }
    let ids: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
    let result = approval_users::Entity::update_many()
        .col_expr(
            approval_users::Column::DeletedAt,
            Expr::value(Utc::now().fixed_offset()),
        )
        .filter(approval_users::Column::Id.is_in(ids))
        .filter(approval_users::Column::DeletedAt.is_null())
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Soft-deletes a setting together with its levels and approvers.
pub(crate) async fn retire_setting<C: ConnectionTrait>(
    conn: &C,
    setting_id: Uuid,
) -> Result<(), DbErr> {
    let now = Utc::now().fixed_offset();
    let level_ids: Vec<Uuid> = approval_levels::Entity::find()
        .select_only()
        .column(approval_levels::Column::Id)
        .filter(approval_levels::Column::ApprovalSettingId.eq(setting_id))
        .filter(approval_levels::Column::DeletedAt.is_null())
        .into_tuple()
        .all(conn)
        .await?;

    if !level_ids.is_empty() {
        approval_users::Entity::update_many()
            .col_expr(approval_users::Column::DeletedAt, Expr::value(now))
            .filter(approval_users::Column::ApprovalLevelId.is_in(level_ids.clone()))
            .filter(approval_users::Column::DeletedAt.is_null())
            .exec(conn)
            .await?;
        approval_levels::Entity::update_many()
            .col_expr(approval_levels::Column::DeletedAt, Expr::value(now))
            .filter(approval_levels::Column::Id.is_in(level_ids))
            .exec(conn)
            .await?;
    }

    approval_settings::Entity::update_many()
        .col_expr(approval_settings::Column::DeletedAt, Expr::value(now))
        .filter(approval_settings::Column::Id.eq(setting_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Repository for tenant-global approval configurations.
#[derive(Debug, Clone)]
pub struct ApprovalRepository {
    db: DatabaseConnection,
}

impl ApprovalRepository {
    /// Creates a new approval repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the tenant-global configuration of a module.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn global_config(
        &self,
        tenant_id: Uuid,
        module: ApprovalModule,
    ) -> Result<Option<ApprovalConfigView>, DbErr> {
        match find_global(&self.db, tenant_id, module).await? {
            Some(setting_id) => config_view(&self.db, setting_id).await,
            None => Ok(None),
        }
    }

    /// Stores the tenant-global configuration of a module.
    ///
    /// Creates the setting on first use, otherwise merges the submission
    /// into the stored levels.
    ///
    /// # Errors
    ///
    /// Returns approval rule violations or database errors.
    pub async fn store_global_config(
        &self,
        tenant_id: Uuid,
        module: ApprovalModule,
        input: &ApprovalConfigInput,
    ) -> Result<ApprovalConfigView, RepoError> {
        let txn = self.db.begin().await?;

        let existing = find_global(&txn, tenant_id, module).await?;
        let setting_id = store_config(&txn, tenant_id, existing, module, true, input)
            .await
            .inspect_err(|e| warn!(%tenant_id, %module, error = %e, "global approval config rejected"))?;
        let view = config_view(&txn, setting_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("approval setting {setting_id}")))?;

        txn.commit().await?;
        info!(%tenant_id, %module, %setting_id, "global approval config stored");
        Ok(view)
    }
}
