//! Placement repository: placements, their timesheet approval source and
//! billing rate history.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use staffdesk_core::approval::{
    ApprovalConfigInput, ApprovalConfigType, ApprovalLevelInput, ApprovalModule,
};
use staffdesk_core::company::{CompanyError, CompanyType};
use staffdesk_core::employee::EmployeeError;
use staffdesk_core::placement::{
    AvailableSettings, BillingPeriod, BillingRates, PlacementError, PlacementParties,
    PlacementSpan, TimesheetApprovalSource, ensure_employee_active, plan_new_billing, rate_on,
    resolve_timesheet_config, validate_dates, validate_parties,
};
use staffdesk_core::reference::PLACEMENT_PREFIX;
use staffdesk_shared::types::{PageRequest, PageResponse};

use crate::entities::{placement_billings, placements};
use crate::repositories::approval::{
    ApprovalConfigView, config_view, ensure_approvers, find_global, insert_setting,
    retire_setting, store_config,
};
use crate::repositories::company;
use crate::repositories::employee;
use crate::repositories::error::RepoError;
use crate::repositories::reference::{insert_conflict, next_reference_id};

/// Filter options for listing placements.
#[derive(Debug, Clone, Default)]
pub struct PlacementFilter {
    /// Only placements of this employee.
    pub employee_id: Option<Uuid>,
    /// Only placements at this client.
    pub client_id: Option<Uuid>,
}

/// Input for creating a placement.
#[derive(Debug, Clone)]
pub struct CreatePlacementInput {
    /// Placed employee.
    pub employee_id: Uuid,
    /// Client company.
    pub client_id: Uuid,
    /// Vendor company.
    pub vendor_id: Option<Uuid>,
    /// End-client company.
    pub end_client_id: Option<Uuid>,
    /// Role at the client.
    pub job_title: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day, open-ended when absent.
    pub end_date: Option<NaiveDate>,
    /// Where timesheet approvals come from.
    pub timesheet_config_type: ApprovalConfigType,
    /// Levels for a custom timesheet configuration.
    pub timesheet_approvals: Vec<ApprovalLevelInput>,
    /// Optional placement-owned invoice approvals.
    pub invoice: Option<ApprovalConfigInput>,
}

/// Input for updating basic placement fields.
#[derive(Debug, Clone, Default)]
pub struct UpdatePlacementInput {
    /// Role at the client.
    pub job_title: Option<String>,
    /// Last day (`Some(None)` reopens the placement).
    pub end_date: Option<Option<NaiveDate>>,
}

/// Input for changing a placement's timesheet approvals.
#[derive(Debug, Clone)]
pub struct PlacementTimesheetConfigInput {
    /// New config type.
    pub config_type: ApprovalConfigType,
    /// Levels and deletions for a custom configuration.
    pub approvals: ApprovalConfigInput,
}

/// Input for adding a billing rate.
#[derive(Debug, Clone)]
pub struct CreateBillingInput {
    /// Rates.
    pub rates: BillingRates,
    /// First day the rates apply.
    pub effective_from: NaiveDate,
}

/// A placement with its approvals and the rates in force today.
#[derive(Debug, Clone)]
pub struct PlacementDetail {
    /// Placement row.
    pub placement: placements::Model,
    /// Timesheet approvals (shared or custom).
    pub timesheet_config: Option<ApprovalConfigView>,
    /// Invoice approvals.
    pub invoice_config: Option<ApprovalConfigView>,
    /// Billing in force today.
    pub current_billing: Option<placement_billings::Model>,
}

fn config_type(model: &placements::Model) -> Result<ApprovalConfigType, DbErr> {
    ApprovalConfigType::try_from(model.timesheet_approval_config_type).map_err(DbErr::Custom)
}

fn billing_period(model: &placement_billings::Model) -> BillingPeriod {
    BillingPeriod {
        id: model.id,
        rates: BillingRates {
            bill_rate: model.bill_rate,
            overtime_bill_rate: model.overtime_bill_rate,
            pay_rate: model.pay_rate,
        },
        effective_from: model.effective_from,
        effective_to: model.effective_to,
    }
}

async fn find_in_tenant<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    placement_id: Uuid,
    lock: bool,
) -> Result<Option<placements::Model>, DbErr> {
    let mut query = placements::Entity::find_by_id(placement_id)
        .filter(placements::Column::TenantId.eq(tenant_id))
        .filter(placements::Column::DeletedAt.is_null());
    if lock {
        query = query.lock_exclusive();
    }
    query.one(conn).await
}

async fn billing_history<C: ConnectionTrait>(
    conn: &C,
    placement_id: Uuid,
) -> Result<Vec<placement_billings::Model>, DbErr> {
    placement_billings::Entity::find()
        .filter(placement_billings::Column::PlacementId.eq(placement_id))
        .filter(placement_billings::Column::DeletedAt.is_null())
        .order_by_desc(placement_billings::Column::EffectiveFrom)
        .all(conn)
        .await
}

/// Loads an active company and its stored type.
async fn party<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    company_id: Uuid,
) -> Result<(crate::entities::companies::Model, CompanyType), RepoError> {
    let model = company::find_in_tenant(conn, tenant_id, company_id, false)
        .await?
        .ok_or(CompanyError::NotFound(company_id))?;
    if !model.is_active {
        return Err(CompanyError::Inactive(company_id).into());
    }
    let company_type = company::company_type(&model)?;
    Ok((model, company_type))
}

/// Turns a resolved source into a setting id, creating custom settings.
async fn materialize<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    source: TimesheetApprovalSource,
) -> Result<Uuid, RepoError> {
    match source {
        TimesheetApprovalSource::Shared(setting_id) => Ok(setting_id),
        TimesheetApprovalSource::Custom(levels) => {
            let approver_ids: Vec<Uuid> = levels
                .iter()
                .flat_map(|l| l.approver_ids.iter().copied())
                .collect();
            ensure_approvers(conn, tenant_id, &approver_ids).await?;
            Ok(insert_setting(conn, tenant_id, ApprovalModule::Timesheet, false, &levels).await?)
        }
    }
}

async fn detail<C: ConnectionTrait>(
    conn: &C,
    placement: placements::Model,
) -> Result<PlacementDetail, DbErr> {
    let timesheet_config = match placement.timesheet_approval_id {
        Some(id) => config_view(conn, id).await?,
        None => None,
    };
    let invoice_config = match placement.invoice_approval_id {
        Some(id) => config_view(conn, id).await?,
        None => None,
    };

    let history = billing_history(conn, placement.id).await?;
    let periods: Vec<BillingPeriod> = history.iter().map(billing_period).collect();
    let current_id = rate_on(&periods, Utc::now().date_naive()).map(|p| p.id);
    let current_billing = current_id.and_then(|id| history.into_iter().find(|b| b.id == id));

    Ok(PlacementDetail {
        placement,
        timesheet_config,
        invoice_config,
        current_billing,
    })
}

/// Placement repository.
#[derive(Debug, Clone)]
pub struct PlacementRepository {
    db: DatabaseConnection,
}

impl PlacementRepository {
    /// Creates a new placement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists placements of a tenant, newest start first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &PlacementFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<placements::Model>, DbErr> {
        let mut query = placements::Entity::find()
            .filter(placements::Column::TenantId.eq(tenant_id))
            .filter(placements::Column::DeletedAt.is_null());
        if let Some(employee_id) = filter.employee_id {
            query = query.filter(placements::Column::EmployeeId.eq(employee_id));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(placements::Column::ClientId.eq(client_id));
        }

        let total = query.clone().count(&self.db).await?;
        let data = query
            .order_by_desc(placements::Column::StartDate)
            .order_by_asc(placements::Column::ReferenceId)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Finds a placement with its approvals and current rates.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        tenant_id: Uuid,
        placement_id: Uuid,
    ) -> Result<Option<PlacementDetail>, DbErr> {
        match find_in_tenant(&self.db, tenant_id, placement_id, false).await? {
            Some(placement) => Ok(Some(detail(&self.db, placement).await?)),
            None => Ok(None),
        }
    }

    /// Creates a placement in one transaction.
    ///
    /// # Errors
    ///
    /// Employee, company, placement or approval rule violations, or a
    /// database error.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        input: CreatePlacementInput,
    ) -> Result<PlacementDetail, RepoError> {
        validate_dates(input.start_date, input.end_date)?;

        let txn = self.db.begin().await?;

        let employee = employee::find_in_tenant(&txn, tenant_id, input.employee_id, false)
            .await?
            .ok_or(EmployeeError::NotFound(input.employee_id))?;
        let snapshot = employee::snapshot(&employee)?;
        ensure_employee_active(employee.id, snapshot.status)?;

        let (client, client_type) = party(&txn, tenant_id, input.client_id).await?;
        let vendor = match input.vendor_id {
            Some(id) => Some((id, party(&txn, tenant_id, id).await?.1)),
            None => None,
        };
        let end_client = match input.end_client_id {
            Some(id) => Some((id, party(&txn, tenant_id, id).await?.1)),
            None => None,
        };
        validate_parties(&PlacementParties {
            client: (client.id, client_type),
            vendor,
            end_client,
        })?;

        let available = AvailableSettings {
            client_timesheet: client.timesheet_approval_id,
            global_timesheet: find_global(&txn, tenant_id, ApprovalModule::Timesheet).await?,
        };
        let source = resolve_timesheet_config(
            input.timesheet_config_type,
            available,
            &input.timesheet_approvals,
        )
        .inspect_err(|e| warn!(%tenant_id, error = %e, "placement timesheet config rejected"))?;
        let timesheet_approval_id = materialize(&txn, tenant_id, source).await?;

        let invoice_approval_id = match &input.invoice {
            Some(invoice) => Some(
                store_config(&txn, tenant_id, None, ApprovalModule::Invoice, false, invoice)
                    .await?,
            ),
            None => None,
        };

        let reference_id =
            next_reference_id(&txn, "placements", tenant_id, PLACEMENT_PREFIX).await?;
        let now = Utc::now().into();

        let placement = placements::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(tenant_id),
            reference_id: Set(reference_id),
            employee_id: Set(input.employee_id),
            client_id: Set(input.client_id),
            vendor_id: Set(input.vendor_id),
            end_client_id: Set(input.end_client_id),
            job_title: Set(input.job_title),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            timesheet_approval_config_type: Set(input.timesheet_config_type.id()),
            timesheet_approval_id: Set(Some(timesheet_approval_id)),
            invoice_approval_id: Set(invoice_approval_id),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| insert_conflict(e, "Placement reference already exists"))?;

        let detail = detail(&txn, placement).await?;
        txn.commit().await?;

        info!(
            %tenant_id,
            placement_id = %detail.placement.id,
            employee_id = %detail.placement.employee_id,
            config_type = detail.placement.timesheet_approval_config_type,
            "placement created"
        );
        Ok(detail)
    }

    /// Updates basic placement fields.
    ///
    /// # Errors
    ///
    /// `NotFound`, `EndBeforeStart`, or a database error.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        placement_id: Uuid,
        input: UpdatePlacementInput,
    ) -> Result<PlacementDetail, RepoError> {
        let placement = find_in_tenant(&self.db, tenant_id, placement_id, false)
            .await?
            .ok_or(PlacementError::NotFound(placement_id))?;
        if let Some(end_date) = input.end_date {
            validate_dates(placement.start_date, end_date)?;
        }

        let mut active: placements::ActiveModel = placement.into();
        if let Some(job_title) = input.job_title {
            active.job_title = Set(job_title);
        }
        if let Some(end_date) = input.end_date {
            active.end_date = Set(end_date);
        }
        active.updated_at = Set(Utc::now().into());
        let placement = active.update(&self.db).await?;

        Ok(detail(&self.db, placement).await?)
    }

    /// Changes where a placement's timesheet approvals come from.
    ///
    /// Custom to custom merges into the owned setting. Leaving custom
    /// retires the owned setting.
    ///
    /// # Errors
    ///
    /// `NotFound`, placement or approval rule violations, or a database
    /// error.
    pub async fn update_timesheet_config(
        &self,
        tenant_id: Uuid,
        placement_id: Uuid,
        input: PlacementTimesheetConfigInput,
    ) -> Result<PlacementDetail, RepoError> {
        let txn = self.db.begin().await?;

        let placement = find_in_tenant(&txn, tenant_id, placement_id, true)
            .await?
            .ok_or(PlacementError::NotFound(placement_id))?;
        let current_type = config_type(&placement)?;
        let owned = placement
            .timesheet_approval_id
            .filter(|_| current_type.is_custom());

        let setting_id = match owned {
            Some(existing) if input.config_type.is_custom() => {
                store_config(
                    &txn,
                    tenant_id,
                    Some(existing),
                    ApprovalModule::Timesheet,
                    false,
                    &input.approvals,
                )
                .await?
            }
            _ => {
                let client = company::find_in_tenant(&txn, tenant_id, placement.client_id, false)
                    .await?
                    .ok_or(CompanyError::NotFound(placement.client_id))?;
                let available = AvailableSettings {
                    client_timesheet: client.timesheet_approval_id,
                    global_timesheet: find_global(&txn, tenant_id, ApprovalModule::Timesheet)
                        .await?,
                };
                let source = resolve_timesheet_config(
                    input.config_type,
                    available,
                    &input.approvals.approvals,
                )?;
                let setting_id = materialize(&txn, tenant_id, source).await?;
                if let Some(previous) = owned {
                    retire_setting(&txn, previous).await?;
                }
                setting_id
            }
        };

        let mut active: placements::ActiveModel = placement.into();
        active.timesheet_approval_config_type = Set(input.config_type.id());
        active.timesheet_approval_id = Set(Some(setting_id));
        active.updated_at = Set(Utc::now().into());
        let placement = active.update(&txn).await?;

        let detail = detail(&txn, placement).await?;
        txn.commit().await?;
        info!(
            %tenant_id,
            %placement_id,
            %setting_id,
            config_type = input.config_type.id(),
            "placement timesheet config updated"
        );
        Ok(detail)
    }

    /// Returns a placement's billing history, latest first.
    ///
    /// # Errors
    ///
    /// `NotFound`, or a database error.
    pub async fn list_billings(
        &self,
        tenant_id: Uuid,
        placement_id: Uuid,
    ) -> Result<Vec<placement_billings::Model>, RepoError> {
        find_in_tenant(&self.db, tenant_id, placement_id, false)
            .await?
            .ok_or(PlacementError::NotFound(placement_id))?;
        Ok(billing_history(&self.db, placement_id).await?)
    }

    /// Adds a billing rate and closes the previous open period.
    ///
    /// # Errors
    ///
    /// `NotFound`, billing rule violations, or a database error.
    pub async fn add_billing(
        &self,
        tenant_id: Uuid,
        placement_id: Uuid,
        input: CreateBillingInput,
    ) -> Result<placement_billings::Model, RepoError> {
        let txn = self.db.begin().await?;

        let placement = find_in_tenant(&txn, tenant_id, placement_id, true)
            .await?
            .ok_or(PlacementError::NotFound(placement_id))?;
        let history: Vec<BillingPeriod> = billing_history(&txn, placement_id)
            .await?
            .iter()
            .map(billing_period)
            .collect();
        let span = PlacementSpan {
            start: placement.start_date,
            end: placement.end_date,
        };

        let closure = plan_new_billing(span, &history, &input.rates, input.effective_from)
            .inspect_err(|e| warn!(%tenant_id, %placement_id, error = %e, "billing rejected"))?;

        let now = Utc::now().fixed_offset();
        if let Some(closure) = closure {
            placement_billings::Entity::update_many()
                .col_expr(
                    placement_billings::Column::EffectiveTo,
                    Expr::value(closure.effective_to),
                )
                .col_expr(placement_billings::Column::UpdatedAt, Expr::value(now))
                .filter(placement_billings::Column::Id.eq(closure.billing_id))
                .exec(&txn)
                .await?;
        }

        let billing = placement_billings::ActiveModel {
            id: Set(Uuid::now_v7()),
            placement_id: Set(placement_id),
            bill_rate: Set(input.rates.bill_rate),
            overtime_bill_rate: Set(input.rates.overtime_bill_rate),
            pay_rate: Set(input.rates.pay_rate),
            effective_from: Set(input.effective_from),
            effective_to: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!(
            %tenant_id,
            %placement_id,
            billing_id = %billing.id,
            effective_from = %billing.effective_from,
            "placement billing added"
        );
        Ok(billing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn billing(from: NaiveDate, to: Option<NaiveDate>) -> placement_billings::Model {
        let now = Utc::now().fixed_offset();
        placement_billings::Model {
            id: Uuid::new_v4(),
            placement_id: Uuid::new_v4(),
            bill_rate: dec!(95.00),
            overtime_bill_rate: dec!(120.00),
            pay_rate: dec!(70.00),
            effective_from: from,
            effective_to: to,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_billing_period_from_row() {
        let from = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let row = billing(from, None);
        let period = billing_period(&row);
        assert_eq!(period.id, row.id);
        assert_eq!(period.rates.margin(), dec!(25.00));
        assert!(period.covers(from));
        assert!(!period.covers(from.pred_opt().unwrap()));
    }
}
