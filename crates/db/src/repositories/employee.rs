//! Employee repository: onboarding, offboarding, rejoin and documents.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use staffdesk_core::employee::{
    DocumentDates, DocumentType, EmployeeError, EmployeeSnapshot, EmployeeStatus, EmploymentType,
    approver_release, ensure_can_deactivate, validate_document, validate_offboarding,
    validate_rejoin,
};
use staffdesk_core::reference::EMPLOYEE_PREFIX;
use staffdesk_shared::types::{PageRequest, PageResponse};

use crate::entities::{employee_documents, employees};
use crate::repositories::approval::{lock_approver_memberships, release_approvers};
use crate::repositories::error::RepoError;
use crate::repositories::reference::{insert_conflict, next_reference_id};
use crate::repositories::session::revoke_employee_sessions;

/// Filter options for listing employees.
#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    /// Only this status.
    pub status: Option<EmployeeStatus>,
    /// Only this employment type.
    pub employment_type: Option<EmploymentType>,
    /// Case-insensitive match on name, email or reference id.
    pub search: Option<String>,
}

/// Input for onboarding an employee.
#[derive(Debug, Clone)]
pub struct CreateEmployeeInput {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email, unique per tenant.
    pub email: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Employment relationship.
    pub employment_type: EmploymentType,
    /// First working day.
    pub joining_date: NaiveDate,
}

/// Input for updating an employee's basic fields.
#[derive(Debug, Clone, Default)]
pub struct UpdateEmployeeInput {
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Phone number (`Some(None)` clears it).
    pub phone: Option<Option<String>>,
}

/// Input for offboarding.
#[derive(Debug, Clone)]
pub struct OffboardInput {
    /// Last working day.
    pub relieving_date: NaiveDate,
    /// Free-text reason.
    pub reason: Option<String>,
}

/// Result of a successful offboarding.
#[derive(Debug, Clone)]
pub struct OffboardOutcome {
    /// Updated employee.
    pub employee: employees::Model,
    /// Approver assignments soft-deleted.
    pub released_approvals: u64,
    /// Sessions revoked.
    pub revoked_sessions: u64,
}

/// Input for adding a document.
#[derive(Debug, Clone)]
pub struct CreateDocumentInput {
    /// Passport or visa.
    pub document_type: DocumentType,
    /// Document number.
    pub document_number: String,
    /// Issuing country.
    pub issuing_country: String,
    /// Visa category.
    pub visa_type: Option<String>,
    /// Issue date.
    pub issued_on: NaiveDate,
    /// Expiry date.
    pub expires_on: NaiveDate,
}

/// Input for updating a document.
#[derive(Debug, Clone, Default)]
pub struct UpdateDocumentInput {
    /// Document number.
    pub document_number: Option<String>,
    /// Issuing country.
    pub issuing_country: Option<String>,
    /// Visa category (`Some(None)` clears it).
    pub visa_type: Option<Option<String>>,
    /// Issue date.
    pub issued_on: Option<NaiveDate>,
    /// Expiry date.
    pub expires_on: Option<NaiveDate>,
}

/// Reads the lifecycle fields of a stored employee.
pub(crate) fn snapshot(model: &employees::Model) -> Result<EmployeeSnapshot, DbErr> {
    let employment_type = EmploymentType::from_id(model.employment_type_id).ok_or_else(|| {
        DbErr::Custom(format!(
            "unknown employment type {}",
            model.employment_type_id
        ))
    })?;
    let status = EmployeeStatus::parse(&model.status)
        .ok_or_else(|| DbErr::Custom(format!("unknown employee status {}", model.status)))?;
    Ok(EmployeeSnapshot {
        id: model.id,
        employment_type,
        status,
        is_tenant_owner: model.is_tenant_owner,
        joining_date: model.joining_date,
        relieving_date: model.relieving_date,
    })
}

/// Finds a non-deleted employee of the tenant.
pub(crate) async fn find_in_tenant<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    employee_id: Uuid,
    lock: bool,
) -> Result<Option<employees::Model>, DbErr> {
    let mut query = employees::Entity::find_by_id(employee_id)
        .filter(employees::Column::TenantId.eq(tenant_id))
        .filter(employees::Column::DeletedAt.is_null());
    if lock {
        query = query.lock_exclusive();
    }
    query.one(conn).await
}

/// Employee repository.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    db: DatabaseConnection,
}

impl EmployeeRepository {
    /// Creates a new employee repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists employees of a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &EmployeeFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<employees::Model>, DbErr> {
        let mut query = employees::Entity::find()
            .filter(employees::Column::TenantId.eq(tenant_id))
            .filter(employees::Column::DeletedAt.is_null());

        if let Some(status) = filter.status {
            query = query.filter(employees::Column::Status.eq(status.as_str()));
        }
        if let Some(employment_type) = filter.employment_type {
            query = query.filter(employees::Column::EmploymentTypeId.eq(employment_type.id()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            let matches = |col: employees::Column| {
                Expr::expr(Func::lower(Expr::col(col))).like(pattern.clone())
            };
            query = query.filter(
                Condition::any()
                    .add(matches(employees::Column::FirstName))
                    .add(matches(employees::Column::LastName))
                    .add(matches(employees::Column::Email))
                    .add(matches(employees::Column::ReferenceId)),
            );
        }

        let total = query.clone().count(&self.db).await?;
        let data = query
            .order_by_asc(employees::Column::ReferenceId)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Finds an employee by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Option<employees::Model>, DbErr> {
        find_in_tenant(&self.db, tenant_id, employee_id, false).await
    }

    async fn email_taken(
        &self,
        tenant_id: Uuid,
        email: &str,
        except: Option<Uuid>,
    ) -> Result<bool, DbErr> {
        let mut query = employees::Entity::find()
            .filter(employees::Column::TenantId.eq(tenant_id))
            .filter(employees::Column::DeletedAt.is_null())
            .filter(
                Expr::expr(Func::lower(Expr::col(employees::Column::Email)))
                    .eq(email.to_lowercase()),
            );
        if let Some(id) = except {
            query = query.filter(employees::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    /// Onboards an employee with the next `EMP-` reference id.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the email is taken, or a database error.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        input: CreateEmployeeInput,
    ) -> Result<employees::Model, RepoError> {
        if self.email_taken(tenant_id, &input.email, None).await? {
            return Err(RepoError::Conflict(format!(
                "Email '{}' is already in use",
                input.email
            )));
        }

        let txn = self.db.begin().await?;
        let reference_id = next_reference_id(&txn, "employees", tenant_id, EMPLOYEE_PREFIX).await?;
        let now = Utc::now().into();

        let employee = employees::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(tenant_id),
            reference_id: Set(reference_id),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            phone: Set(input.phone),
            employment_type_id: Set(input.employment_type.id()),
            status: Set(EmployeeStatus::Active.as_str().to_string()),
            joining_date: Set(input.joining_date),
            relieving_date: Set(None),
            offboarding_reason: Set(None),
            rejoin_count: Set(0),
            is_tenant_owner: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| insert_conflict(e, "Employee reference or email already exists"))?;

        txn.commit().await?;
        info!(%tenant_id, employee_id = %employee.id, reference_id = %employee.reference_id, "employee onboarded");
        Ok(employee)
    }

    /// Updates basic fields.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Conflict` on a taken email, or a database error.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        input: UpdateEmployeeInput,
    ) -> Result<employees::Model, RepoError> {
        let employee = self
            .find(tenant_id, employee_id)
            .await?
            .ok_or(EmployeeError::NotFound(employee_id))?;

        if let Some(email) = &input.email
            && self.email_taken(tenant_id, email, Some(employee_id)).await?
        {
            return Err(RepoError::Conflict(format!("Email '{email}' is already in use")));
        }

        let mut active: employees::ActiveModel = employee.into();
        if let Some(first_name) = input.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deactivates an employee.
    ///
    /// Within one transaction: locks the employee, checks the preconditions,
    /// locks the approval levels they approve on, runs the sole-approver
    /// guard, releases their approver assignments, marks them inactive and
    /// revokes their sessions.
    ///
    /// # Errors
    ///
    /// `NotFound`, `ActionNotAllowed`, `AlreadyInactive`,
    /// `RelievingBeforeJoining`, `SoleApprover`, or a database error.
    pub async fn offboard(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        input: OffboardInput,
    ) -> Result<OffboardOutcome, RepoError> {
        let txn = self.db.begin().await?;

        let employee = find_in_tenant(&txn, tenant_id, employee_id, true).await?;
        let current = employee.as_ref().map(snapshot).transpose()?;
        let current = ensure_can_deactivate(current.as_ref(), employee_id)?;
        validate_offboarding(current, input.relieving_date)?;

        let memberships = lock_approver_memberships(&txn, tenant_id, employee_id).await?;
        let release = approver_release(current, &memberships).inspect_err(|e| {
            warn!(%tenant_id, %employee_id, error = %e, "offboarding blocked");
        })?;
        let released_approvals = release_approvers(&txn, &release).await?;

        let Some(employee) = employee else {
            return Err(EmployeeError::NotFound(employee_id).into());
        };
        let mut active: employees::ActiveModel = employee.into();
        active.status = Set(EmployeeStatus::Inactive.as_str().to_string());
        active.relieving_date = Set(Some(input.relieving_date));
        active.offboarding_reason = Set(input.reason);
        active.updated_at = Set(Utc::now().into());
        let employee = active.update(&txn).await?;

        let revoked_sessions = revoke_employee_sessions(&txn, employee_id).await?;

        txn.commit().await?;
        info!(
            %tenant_id,
            %employee_id,
            released_approvals,
            revoked_sessions,
            "employee offboarded"
        );

        Ok(OffboardOutcome {
            employee,
            released_approvals,
            revoked_sessions,
        })
    }

    /// Reactivates an offboarded employee.
    ///
    /// # Errors
    ///
    /// `NotFound`, `StillActive`, `RejoinBeforeRelieving`, or a database error.
    pub async fn rejoin(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        joining_date: NaiveDate,
    ) -> Result<employees::Model, RepoError> {
        let txn = self.db.begin().await?;

        let employee = find_in_tenant(&txn, tenant_id, employee_id, true)
            .await?
            .ok_or(EmployeeError::NotFound(employee_id))?;
        validate_rejoin(&snapshot(&employee)?, joining_date)?;

        let rejoin_count = employee.rejoin_count + 1;
        let mut active: employees::ActiveModel = employee.into();
        active.status = Set(EmployeeStatus::Active.as_str().to_string());
        active.joining_date = Set(joining_date);
        active.relieving_date = Set(None);
        active.offboarding_reason = Set(None);
        active.rejoin_count = Set(rejoin_count);
        active.updated_at = Set(Utc::now().into());
        let employee = active.update(&txn).await?;

        txn.commit().await?;
        info!(%tenant_id, %employee_id, rejoin_count, "employee rejoined");
        Ok(employee)
    }

    async fn require(&self, tenant_id: Uuid, employee_id: Uuid) -> Result<(), RepoError> {
        match self.find(tenant_id, employee_id).await? {
            Some(_) => Ok(()),
            None => Err(EmployeeError::NotFound(employee_id).into()),
        }
    }

    /// Lists an employee's documents, newest expiry first.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown employee, or a database error.
    pub async fn list_documents(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Vec<employee_documents::Model>, RepoError> {
        self.require(tenant_id, employee_id).await?;
        Ok(employee_documents::Entity::find()
            .filter(employee_documents::Column::EmployeeId.eq(employee_id))
            .filter(employee_documents::Column::DeletedAt.is_null())
            .order_by_desc(employee_documents::Column::ExpiresOn)
            .all(&self.db)
            .await?)
    }

    async fn find_document(
        &self,
        employee_id: Uuid,
        document_id: Uuid,
    ) -> Result<employee_documents::Model, RepoError> {
        employee_documents::Entity::find_by_id(document_id)
            .filter(employee_documents::Column::EmployeeId.eq(employee_id))
            .filter(employee_documents::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| EmployeeError::DocumentNotFound(document_id).into())
    }

    /// Adds a passport or visa.
    ///
    /// # Errors
    ///
    /// Date/visa rule violations, `Conflict` when an unexpired document of
    /// the same type and number exists, or a database error.
    pub async fn create_document(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        input: CreateDocumentInput,
    ) -> Result<employee_documents::Model, RepoError> {
        self.require(tenant_id, employee_id).await?;
        validate_document(&DocumentDates {
            document_type: input.document_type,
            visa_type: input.visa_type.as_deref(),
            issued_on: input.issued_on,
            expires_on: input.expires_on,
        })?;

        let today = Utc::now().date_naive();
        let duplicates = employee_documents::Entity::find()
            .filter(employee_documents::Column::EmployeeId.eq(employee_id))
            .filter(employee_documents::Column::DocumentType.eq(input.document_type.as_str()))
            .filter(employee_documents::Column::DocumentNumber.eq(input.document_number.clone()))
            .filter(employee_documents::Column::ExpiresOn.gte(today))
            .filter(employee_documents::Column::DeletedAt.is_null())
            .count(&self.db)
            .await?;
        if duplicates > 0 {
            return Err(RepoError::Conflict(format!(
                "An active {} with number '{}' already exists",
                input.document_type.as_str(),
                input.document_number
            )));
        }

        let now = Utc::now().into();
        let document = employee_documents::ActiveModel {
            id: Set(Uuid::now_v7()),
            employee_id: Set(employee_id),
            document_type: Set(input.document_type.as_str().to_string()),
            document_number: Set(input.document_number),
            issuing_country: Set(input.issuing_country),
            visa_type: Set(input.visa_type),
            issued_on: Set(input.issued_on),
            expires_on: Set(input.expires_on),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        info!(%tenant_id, %employee_id, document_id = %document.id, "employee document added");
        Ok(document)
    }

    /// Updates a document; the merged result must still be valid.
    ///
    /// # Errors
    ///
    /// `NotFound`/`DocumentNotFound`, rule violations, or a database error.
    pub async fn update_document(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        document_id: Uuid,
        input: UpdateDocumentInput,
    ) -> Result<employee_documents::Model, RepoError> {
        self.require(tenant_id, employee_id).await?;
        let document = self.find_document(employee_id, document_id).await?;

        let document_type = DocumentType::parse(&document.document_type).ok_or_else(|| {
            DbErr::Custom(format!("unknown document type {}", document.document_type))
        })?;
        let visa_type = input
            .visa_type
            .clone()
            .unwrap_or_else(|| document.visa_type.clone());
        let issued_on = input.issued_on.unwrap_or(document.issued_on);
        let expires_on = input.expires_on.unwrap_or(document.expires_on);
        validate_document(&DocumentDates {
            document_type,
            visa_type: visa_type.as_deref(),
            issued_on,
            expires_on,
        })?;

        let mut active: employee_documents::ActiveModel = document.into();
        if let Some(number) = input.document_number {
            active.document_number = Set(number);
        }
        if let Some(country) = input.issuing_country {
            active.issuing_country = Set(country);
        }
        active.visa_type = Set(visa_type);
        active.issued_on = Set(issued_on);
        active.expires_on = Set(expires_on);
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Soft-deletes a document.
    ///
    /// # Errors
    ///
    /// `NotFound`/`DocumentNotFound`, or a database error.
    pub async fn delete_document(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        document_id: Uuid,
    ) -> Result<(), RepoError> {
        self.require(tenant_id, employee_id).await?;
        let document = self.find_document(employee_id, document_id).await?;

        let mut active: employee_documents::ActiveModel = document.into();
        active.deleted_at = Set(Some(Utc::now().into()));
        active.update(&self.db).await?;

        info!(%tenant_id, %employee_id, %document_id, "employee document deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(employment_type_id: i16, status: &str) -> employees::Model {
        let now = Utc::now().into();
        employees::Model {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            reference_id: "EMP-0001".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: None,
            employment_type_id,
            status: status.into(),
            joining_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            relieving_date: None,
            offboarding_reason: None,
            rejoin_count: 0,
            is_tenant_owner: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_snapshot_reads_lifecycle_fields() {
        let snap = snapshot(&model(1, "active")).unwrap();
        assert_eq!(snap.employment_type, EmploymentType::Internal);
        assert_eq!(snap.status, EmployeeStatus::Active);
    }

    #[test]
    fn test_snapshot_rejects_unknown_values() {
        assert!(snapshot(&model(7, "active")).is_err());
        assert!(snapshot(&model(2, "archived")).is_err());
    }
}
