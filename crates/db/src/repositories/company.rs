//! Company repository for clients, vendors and end-clients.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use staffdesk_core::approval::{ApprovalConfigInput, ApprovalModule};
use staffdesk_core::company::{
    CompanyError, CompanyType, TimesheetCycle, ensure_client_config, ensure_deletable,
    validate_timesheet_config,
};
use staffdesk_shared::types::{PageRequest, PageResponse};

use crate::entities::{companies, placements};
use crate::repositories::approval::{ApprovalConfigView, config_view, store_config};
use crate::repositories::error::RepoError;
use crate::repositories::reference::{insert_conflict, next_reference_id};

/// Filter options for listing companies.
#[derive(Debug, Clone, Default)]
pub struct CompanyFilter {
    /// Only this type.
    pub company_type: Option<CompanyType>,
    /// Case-insensitive match on name or reference id.
    pub search: Option<String>,
}

/// Timesheet cycle plus approval levels.
#[derive(Debug, Clone, Default)]
pub struct TimesheetConfigInput {
    /// Submission cycle.
    pub cycle: Option<TimesheetCycle>,
    /// Approval levels and deletions.
    pub approvals: ApprovalConfigInput,
}

/// Input for creating a company.
#[derive(Debug, Clone)]
pub struct CreateCompanyInput {
    /// Company name.
    pub name: String,
    /// Company role.
    pub company_type: CompanyType,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Optional timesheet configuration (clients only).
    pub timesheet: Option<TimesheetConfigInput>,
    /// Optional invoice approvals (clients only).
    pub invoice: Option<ApprovalConfigInput>,
}

/// Input for updating basic company fields.
#[derive(Debug, Clone, Default)]
pub struct UpdateCompanyInput {
    /// Company name.
    pub name: Option<String>,
    /// Contact email (`Some(None)` clears it).
    pub email: Option<Option<String>>,
    /// Contact phone (`Some(None)` clears it).
    pub phone: Option<Option<String>>,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// A company with its approval configurations.
#[derive(Debug, Clone)]
pub struct CompanyDetail {
    /// Company row.
    pub company: companies::Model,
    /// Timesheet approvals.
    pub timesheet_config: Option<ApprovalConfigView>,
    /// Invoice approvals.
    pub invoice_config: Option<ApprovalConfigView>,
}

pub(crate) fn company_type(model: &companies::Model) -> Result<CompanyType, DbErr> {
    CompanyType::parse(&model.company_type)
        .ok_or_else(|| DbErr::Custom(format!("unknown company type {}", model.company_type)))
}

/// Finds a non-deleted company of the tenant.
pub(crate) async fn find_in_tenant<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    company_id: Uuid,
    lock: bool,
) -> Result<Option<companies::Model>, DbErr> {
    let mut query = companies::Entity::find_by_id(company_id)
        .filter(companies::Column::TenantId.eq(tenant_id))
        .filter(companies::Column::DeletedAt.is_null());
    if lock {
        query = query.lock_exclusive();
    }
    query.one(conn).await
}

async fn detail<C: ConnectionTrait>(
    conn: &C,
    company: companies::Model,
) -> Result<CompanyDetail, DbErr> {
    let timesheet_config = match company.timesheet_approval_id {
        Some(id) => config_view(conn, id).await?,
        None => None,
    };
    let invoice_config = match company.invoice_approval_id {
        Some(id) => config_view(conn, id).await?,
        None => None,
    };
    Ok(CompanyDetail {
        company,
        timesheet_config,
        invoice_config,
    })
}

/// Company repository.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists companies of a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &CompanyFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<companies::Model>, DbErr> {
        let mut query = companies::Entity::find()
            .filter(companies::Column::TenantId.eq(tenant_id))
            .filter(companies::Column::DeletedAt.is_null());

        if let Some(company_type) = filter.company_type {
            query = query.filter(companies::Column::CompanyType.eq(company_type.as_str()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(companies::Column::Name))).like(pattern.clone()))
                    .add(
                        Expr::expr(Func::lower(Expr::col(companies::Column::ReferenceId)))
                            .like(pattern),
                    ),
            );
        }

        let total = query.clone().count(&self.db).await?;
        let data = query
            .order_by_asc(companies::Column::Name)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Finds a company with its approval configurations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        tenant_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<CompanyDetail>, DbErr> {
        match find_in_tenant(&self.db, tenant_id, company_id, false).await? {
            Some(company) => Ok(Some(detail(&self.db, company).await?)),
            None => Ok(None),
        }
    }

    /// Creates a company and its approval configurations in one transaction.
    ///
    /// # Errors
    ///
    /// Company or approval rule violations, or a database error.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        input: CreateCompanyInput,
    ) -> Result<CompanyDetail, RepoError> {
        let cycle = match &input.timesheet {
            Some(timesheet) => Some(validate_timesheet_config(input.company_type, timesheet.cycle)?),
            None => None,
        };
        if input.invoice.is_some() {
            ensure_client_config(input.company_type)?;
        }

        let txn = self.db.begin().await?;

        let timesheet_approval_id = match &input.timesheet {
            Some(timesheet) if !timesheet.approvals.approvals.is_empty() => Some(
                store_config(
                    &txn,
                    tenant_id,
                    None,
                    ApprovalModule::Timesheet,
                    false,
                    &timesheet.approvals,
                )
                .await?,
            ),
            _ => None,
        };
        let invoice_approval_id = match &input.invoice {
            Some(invoice) => Some(
                store_config(&txn, tenant_id, None, ApprovalModule::Invoice, false, invoice)
                    .await?,
            ),
            None => None,
        };

        let prefix = input.company_type.reference_prefix();
        let reference_id = next_reference_id(&txn, "companies", tenant_id, prefix).await?;
        let now = Utc::now().into();

        let company = companies::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(tenant_id),
            reference_id: Set(reference_id),
            name: Set(input.name),
            company_type: Set(input.company_type.as_str().to_string()),
            email: Set(input.email),
            phone: Set(input.phone),
            timesheet_cycle: Set(cycle.map(|c| c.as_str().to_string())),
            timesheet_approval_id: Set(timesheet_approval_id),
            invoice_approval_id: Set(invoice_approval_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| insert_conflict(e, "Company reference already exists"))?;

        let detail = detail(&txn, company).await?;
        txn.commit().await?;

        info!(
            %tenant_id,
            company_id = %detail.company.id,
            reference_id = %detail.company.reference_id,
            "company created"
        );
        Ok(detail)
    }

    /// Updates basic company fields.
    ///
    /// # Errors
    ///
    /// `NotFound`, or a database error.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        company_id: Uuid,
        input: UpdateCompanyInput,
    ) -> Result<CompanyDetail, RepoError> {
        let company = find_in_tenant(&self.db, tenant_id, company_id, false)
            .await?
            .ok_or(CompanyError::NotFound(company_id))?;

        let mut active: companies::ActiveModel = company.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());
        let company = active.update(&self.db).await?;

        Ok(detail(&self.db, company).await?)
    }

    /// Replaces the timesheet cycle and merges timesheet approvals.
    ///
    /// # Errors
    ///
    /// `NotFound`, company or approval rule violations, or a database error.
    pub async fn update_timesheet_config(
        &self,
        tenant_id: Uuid,
        company_id: Uuid,
        input: TimesheetConfigInput,
    ) -> Result<CompanyDetail, RepoError> {
        let txn = self.db.begin().await?;

        let company = find_in_tenant(&txn, tenant_id, company_id, true)
            .await?
            .ok_or(CompanyError::NotFound(company_id))?;
        let cycle = validate_timesheet_config(company_type(&company)?, input.cycle)?;

        let setting_id = store_config(
            &txn,
            tenant_id,
            company.timesheet_approval_id,
            ApprovalModule::Timesheet,
            false,
            &input.approvals,
        )
        .await
        .inspect_err(|e| warn!(%tenant_id, %company_id, error = %e, "timesheet config rejected"))?;

        let mut active: companies::ActiveModel = company.into();
        active.timesheet_cycle = Set(Some(cycle.as_str().to_string()));
        active.timesheet_approval_id = Set(Some(setting_id));
        active.updated_at = Set(Utc::now().into());
        let company = active.update(&txn).await?;

        let detail = detail(&txn, company).await?;
        txn.commit().await?;
        info!(%tenant_id, %company_id, %setting_id, "company timesheet config updated");
        Ok(detail)
    }

    /// Merges invoice approvals.
    ///
    /// # Errors
    ///
    /// `NotFound`, company or approval rule violations, or a database error.
    pub async fn update_invoice_config(
        &self,
        tenant_id: Uuid,
        company_id: Uuid,
        input: ApprovalConfigInput,
    ) -> Result<CompanyDetail, RepoError> {
        let txn = self.db.begin().await?;

        let company = find_in_tenant(&txn, tenant_id, company_id, true)
            .await?
            .ok_or(CompanyError::NotFound(company_id))?;
        ensure_client_config(company_type(&company)?)?;

        let setting_id = store_config(
            &txn,
            tenant_id,
            company.invoice_approval_id,
            ApprovalModule::Invoice,
            false,
            &input,
        )
        .await
        .inspect_err(|e| warn!(%tenant_id, %company_id, error = %e, "invoice config rejected"))?;

        let mut active: companies::ActiveModel = company.into();
        active.invoice_approval_id = Set(Some(setting_id));
        active.updated_at = Set(Utc::now().into());
        let company = active.update(&txn).await?;

        let detail = detail(&txn, company).await?;
        txn.commit().await?;
        info!(%tenant_id, %company_id, %setting_id, "company invoice config updated");
        Ok(detail)
    }

    /// Counts placements referencing the company that have not ended.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_active_placements(&self, company_id: Uuid) -> Result<u64, DbErr> {
        let today = Utc::now().date_naive();
        placements::Entity::find()
            .filter(
                Condition::any()
                    .add(placements::Column::ClientId.eq(company_id))
                    .add(placements::Column::VendorId.eq(company_id))
                    .add(placements::Column::EndClientId.eq(company_id)),
            )
            .filter(placements::Column::DeletedAt.is_null())
            .filter(
                Condition::any()
                    .add(placements::Column::EndDate.is_null())
                    .add(placements::Column::EndDate.gte(today)),
            )
            .count(&self.db)
            .await
    }

    /// Soft-deletes a company.
    ///
    /// # Errors
    ///
    /// `NotFound`, `MappedToPlacements`, or a database error.
    pub async fn delete(&self, tenant_id: Uuid, company_id: Uuid) -> Result<(), RepoError> {
        let company = find_in_tenant(&self.db, tenant_id, company_id, false)
            .await?
            .ok_or(CompanyError::NotFound(company_id))?;

        let active_placements = self.count_active_placements(company_id).await?;
        ensure_deletable(active_placements).inspect_err(|e| {
            warn!(%tenant_id, %company_id, error = %e, "company delete blocked");
        })?;

        let mut active: companies::ActiveModel = company.into();
        active.deleted_at = Set(Some(Utc::now().into()));
        active.update(&self.db).await?;

        info!(%tenant_id, %company_id, "company deleted");
        Ok(())
    }
}
