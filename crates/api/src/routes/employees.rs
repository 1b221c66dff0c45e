//! Employee routes: onboarding, updates, offboarding and rejoin.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use staffdesk_core::CoreError;
use staffdesk_core::employee::{EmployeeError, EmployeeStatus, EmploymentType};
use staffdesk_db::EmployeeRepository;
use staffdesk_db::entities::employees;
use staffdesk_db::repositories::{
    CreateEmployeeInput, EmployeeFilter, OffboardInput, UpdateEmployeeInput,
};

use super::page_request;
use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::middleware::AuthUser;
use crate::response::Envelope;

/// Creates the employee routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/{id}", get(get_employee).patch(update_employee))
        .route("/employees/{id}/offboard", post(offboard_employee))
        .route("/employees/{id}/rejoin", post(rejoin_employee))
}

/// Query parameters for listing employees.
#[derive(Debug, Deserialize)]
pub struct ListEmployeesQuery {
    /// `active` or `inactive`.
    pub status: Option<EmployeeStatus>,
    /// 1 internal, 2 consultant.
    pub employment_type_id: Option<EmploymentType>,
    /// Name, email or reference id contains.
    pub search: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    #[serde(alias = "perPage")]
    pub per_page: Option<u32>,
}

/// Request body for onboarding an employee.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmployeeRequest {
    /// First name.
    #[validate(length(min = 1, max = 100, message = "first_name must be 1-100 characters"))]
    pub first_name: String,
    /// Last name.
    #[validate(length(min = 1, max = 100, message = "last_name must be 1-100 characters"))]
    pub last_name: String,
    /// Email, unique per tenant.
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    /// Phone number.
    #[validate(length(max = 32, message = "phone must be at most 32 characters"))]
    pub phone: Option<String>,
    /// 1 internal, 2 consultant.
    pub employment_type_id: EmploymentType,
    /// First working day.
    pub joining_date: NaiveDate,
}

/// Request body for updating an employee.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmployeeRequest {
    /// First name.
    #[validate(length(min = 1, max = 100, message = "first_name must be 1-100 characters"))]
    pub first_name: Option<String>,
    /// Last name.
    #[validate(length(min = 1, max = 100, message = "last_name must be 1-100 characters"))]
    pub last_name: Option<String>,
    /// Email.
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    /// Phone number.
    #[validate(length(max = 32, message = "phone must be at most 32 characters"))]
    pub phone: Option<String>,
}

/// Request body for offboarding.
#[derive(Debug, Deserialize, Validate)]
pub struct OffboardRequest {
    /// Last working day.
    pub relieving_date: NaiveDate,
    /// Free-text reason.
    #[validate(length(max = 1000, message = "reason must be at most 1000 characters"))]
    pub reason: Option<String>,
}

/// Request body for rejoining.
#[derive(Debug, Deserialize, Validate)]
pub struct RejoinRequest {
    /// New first working day.
    pub joining_date: NaiveDate,
}

/// Employee as returned by the API.
#[derive(Debug, Serialize)]
pub struct EmployeeResponse {
    /// Employee ID.
    pub id: Uuid,
    /// `EMP-` reference.
    pub reference_id: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email.
    pub email: String,
    /// Phone number.
    pub phone: Option<String>,
    /// 1 internal, 2 consultant.
    pub employment_type_id: i16,
    /// `active` or `inactive`.
    pub status: String,
    /// First working day.
    pub joining_date: NaiveDate,
    /// Last working day.
    pub relieving_date: Option<NaiveDate>,
    /// Reason given at offboarding.
    pub offboarding_reason: Option<String>,
    /// Times rejoined.
    pub rejoin_count: i32,
    /// Tenant owner flag.
    pub is_tenant_owner: bool,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last update time.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<employees::Model> for EmployeeResponse {
    fn from(e: employees::Model) -> Self {
        Self {
            id: e.id,
            reference_id: e.reference_id,
            first_name: e.first_name,
            last_name: e.last_name,
            email: e.email,
            phone: e.phone,
            employment_type_id: e.employment_type_id,
            status: e.status,
            joining_date: e.joining_date,
            relieving_date: e.relieving_date,
            offboarding_reason: e.offboarding_reason,
            rejoin_count: e.rejoin_count,
            is_tenant_owner: e.is_tenant_owner,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

/// Offboarding result.
#[derive(Debug, Serialize)]
pub struct OffboardResponse {
    /// Updated employee.
    pub employee: EmployeeResponse,
    /// Approver assignments released.
    pub released_approvals: u64,
    /// Sessions revoked.
    pub revoked_sessions: u64,
}

/// GET `/employees` - List employees.
async fn list_employees(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ListEmployeesQuery>,
) -> ApiResult<Envelope<Vec<EmployeeResponse>>> {
    let repo = EmployeeRepository::new((*state.db).clone());
    let filter = EmployeeFilter {
        status: query.status,
        employment_type: query.employment_type_id,
        search: query.search,
    };
    let page = repo
        .list(auth.tenant_id(), &filter, &page_request(query.page, query.per_page))
        .await?;
    Ok(Envelope::page("Employees fetched", page.map(EmployeeResponse::from)))
}

/// POST `/employees` - Onboard an employee.
async fn create_employee(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateEmployeeRequest>,
) -> ApiResult<Envelope<EmployeeResponse>> {
    let repo = EmployeeRepository::new((*state.db).clone());
    let employee = repo
        .create(
            auth.tenant_id(),
            CreateEmployeeInput {
                first_name: payload.first_name.trim().to_string(),
                last_name: payload.last_name.trim().to_string(),
                email: payload.email.trim().to_lowercase(),
                phone: payload.phone,
                employment_type: payload.employment_type_id,
                joining_date: payload.joining_date,
            },
        )
        .await?;

    info!(
        tenant_id = %auth.tenant_id(),
        created_by = %auth.employee_id(),
        employee_id = %employee.id,
        "Employee onboarded via API"
    );
    Ok(Envelope::created("Employee created", employee.into()))
}

/// GET `/employees/{id}` - Single employee.
async fn get_employee(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Envelope<EmployeeResponse>> {
    let repo = EmployeeRepository::new((*state.db).clone());
    let employee = repo
        .find(auth.tenant_id(), id)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::from(EmployeeError::NotFound(id))))?;
    Ok(Envelope::ok("Employee fetched", employee.into()))
}

/// PATCH `/employees/{id}` - Update basic fields.
async fn update_employee(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateEmployeeRequest>,
) -> ApiResult<Envelope<EmployeeResponse>> {
    let repo = EmployeeRepository::new((*state.db).clone());
    let employee = repo
        .update(
            auth.tenant_id(),
            id,
            UpdateEmployeeInput {
                first_name: payload.first_name.map(|s| s.trim().to_string()),
                last_name: payload.last_name.map(|s| s.trim().to_string()),
                email: payload.email.map(|s| s.trim().to_lowercase()),
                phone: payload.phone.map(Some),
            },
        )
        .await?;
    Ok(Envelope::ok("Employee updated", employee.into()))
}

/// POST `/employees/{id}/offboard` - Deactivate, release approvals, revoke sessions.
async fn offboard_employee(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<OffboardRequest>,
) -> ApiResult<Envelope<OffboardResponse>> {
    let repo = EmployeeRepository::new((*state.db).clone());
    let outcome = repo
        .offboard(
            auth.tenant_id(),
            id,
            OffboardInput {
                relieving_date: payload.relieving_date,
                reason: payload.reason,
            },
        )
        .await?;

    info!(
        tenant_id = %auth.tenant_id(),
        offboarded_by = %auth.employee_id(),
        employee_id = %id,
        "Employee offboarded via API"
    );
    Ok(Envelope::ok(
        "Employee offboarded",
        OffboardResponse {
            employee: outcome.employee.into(),
            released_approvals: outcome.released_approvals,
            revoked_sessions: outcome.revoked_sessions,
        },
    ))
}

/// POST `/employees/{id}/rejoin` - Reactivate an offboarded employee.
async fn rejoin_employee(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<RejoinRequest>,
) -> ApiResult<Envelope<EmployeeResponse>> {
    let repo = EmployeeRepository::new((*state.db).clone());
    let employee = repo
        .rejoin(auth.tenant_id(), id, payload.joining_date)
        .await?;
    Ok(Envelope::ok("Employee rejoined", employee.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_employment_type_is_numeric() {
        let req: CreateEmployeeRequest = serde_json::from_value(json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "employment_type_id": 2,
            "joining_date": "2025-01-06"
        }))
        .unwrap();
        assert_eq!(req.employment_type_id, EmploymentType::Consultant);
        assert!(req.validate().is_ok());

        let err = serde_json::from_value::<CreateEmployeeRequest>(json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "employment_type_id": 7,
            "joining_date": "2025-01-06"
        }));
        assert!(err.is_err());
    }

    #[test]
    fn test_bad_email_is_rejected() {
        let req = UpdateEmployeeRequest {
            first_name: None,
            last_name: None,
            email: Some("ada-at-example".into()),
            phone: None,
        };
        let err: ApiError = req.validate().unwrap_err().into();
        assert_eq!(err.field(), Some("email"));
    }
}
