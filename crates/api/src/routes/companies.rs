//! Company routes: clients, vendors and end-clients with their approval
//! configurations.

use axum::{
    Router,
    extract::State,
    routing::{get, put},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use staffdesk_core::CoreError;
use staffdesk_core::approval::ApprovalConfigInput;
use staffdesk_core::company::{
    CompanyError, CompanyType, TimesheetCycle, ensure_client_config, validate_timesheet_config,
};
use staffdesk_core::validation::Pipeline;
use staffdesk_db::CompanyRepository;
use staffdesk_db::entities::companies;
use staffdesk_db::repositories::{
    ApprovalConfigView, CompanyDetail, CompanyFilter, CreateCompanyInput, TimesheetConfigInput,
    UpdateCompanyInput,
};

use super::page_request;
use crate::AppState;
use crate::dto::approval::{ApprovalConfigRequest, ApprovalContext, approval_pipeline};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::middleware::AuthUser;
use crate::response::Envelope;

/// Creates the company routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/companies", get(list_companies).post(create_company))
        .route(
            "/companies/{id}",
            get(get_company).patch(update_company).delete(delete_company),
        )
        .route("/companies/{id}/timesheet-config", put(update_timesheet_config))
        .route("/companies/{id}/invoice-config", put(update_invoice_config))
}

/// Query parameters for listing companies.
#[derive(Debug, Deserialize)]
pub struct ListCompaniesQuery {
    /// Only this type.
    pub company_type: Option<CompanyType>,
    /// Name or reference id contains.
    pub search: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    #[serde(alias = "perPage")]
    pub per_page: Option<u32>,
}

/// Timesheet cycle plus approvals.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TimesheetConfigRequest {
    /// Submission cycle, required for clients.
    pub timesheet_cycle: Option<TimesheetCycle>,
    /// Approval levels and deletions.
    #[serde(flatten)]
    #[validate(nested)]
    pub approvals: ApprovalConfigRequest,
}

/// Request body for creating a company.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompanyRequest {
    /// Company name.
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
    /// Company role.
    pub company_type: CompanyType,
    /// Contact email.
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    /// Contact phone.
    #[validate(length(max = 32, message = "phone must be at most 32 characters"))]
    pub phone: Option<String>,
    /// Timesheet configuration (clients only).
    #[validate(nested)]
    pub timesheet_config: Option<TimesheetConfigRequest>,
    /// Invoice approvals (clients only).
    #[validate(nested)]
    pub invoice_config: Option<ApprovalConfigRequest>,
}

/// Request body for updating a company.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCompanyRequest {
    /// Company name.
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: Option<String>,
    /// Contact email.
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    /// Contact phone.
    #[validate(length(max = 32, message = "phone must be at most 32 characters"))]
    pub phone: Option<String>,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// Company as returned by the API.
#[derive(Debug, Serialize)]
pub struct CompanyResponse {
    /// Company ID.
    pub id: Uuid,
    /// `CLI-`/`VEN-`/`ECL-` reference.
    pub reference_id: String,
    /// Company name.
    pub name: String,
    /// Company role.
    pub company_type: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Timesheet cycle.
    pub timesheet_cycle: Option<String>,
    /// Active flag.
    pub is_active: bool,
    /// Timesheet approvals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timesheet_config: Option<ApprovalConfigView>,
    /// Invoice approvals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_config: Option<ApprovalConfigView>,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last update time.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<companies::Model> for CompanyResponse {
    fn from(c: companies::Model) -> Self {
        Self {
            id: c.id,
            reference_id: c.reference_id,
            name: c.name,
            company_type: c.company_type,
            email: c.email,
            phone: c.phone,
            timesheet_cycle: c.timesheet_cycle,
            is_active: c.is_active,
            timesheet_config: None,
            invoice_config: None,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl From<CompanyDetail> for CompanyResponse {
    fn from(detail: CompanyDetail) -> Self {
        Self {
            timesheet_config: detail.timesheet_config,
            invoice_config: detail.invoice_config,
            ..Self::from(detail.company)
        }
    }
}

/// Ordered checks for a new company.
fn create_pipeline<'a>() -> Pipeline<'a, CreateCompanyRequest, (), CoreError> {
    Pipeline::<'a, CreateCompanyRequest, (), CoreError>::new()
        .check("timesheet_cycle", |req: &CreateCompanyRequest| {
            if let Some(config) = &req.timesheet_config {
                validate_timesheet_config(req.company_type, config.timesheet_cycle)?;
            }
            Ok(())
        })
        .check("timesheet_approvals", |req| {
            match req.timesheet_config.as_ref() {
                Some(config) if !config.approvals.approvals.is_empty() => {
                    approval_pipeline(true).run(&config.approvals, ApprovalContext::default())?;
                }
                _ => {}
            }
            Ok(())
        })
        .check("invoice_approvals", |req| {
            if let Some(invoice) = &req.invoice_config {
                ensure_client_config(req.company_type)?;
                approval_pipeline(true).run(invoice, ApprovalContext::default())?;
            }
            Ok(())
        })
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::from(CoreError::from(CompanyError::NotFound(id)))
}

/// GET `/companies` - List companies.
async fn list_companies(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ListCompaniesQuery>,
) -> ApiResult<Envelope<Vec<CompanyResponse>>> {
    let repo = CompanyRepository::new((*state.db).clone());
    let filter = CompanyFilter {
        company_type: query.company_type,
        search: query.search,
    };
    let page = repo
        .list(auth.tenant_id(), &filter, &page_request(query.page, query.per_page))
        .await?;
    Ok(Envelope::page("Companies fetched", page.map(CompanyResponse::from)))
}

/// POST `/companies` - Create a company with optional approval configurations.
async fn create_company(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateCompanyRequest>,
) -> ApiResult<Envelope<CompanyResponse>> {
    create_pipeline().run(&payload, ())?;

    let repo = CompanyRepository::new((*state.db).clone());
    let input = CreateCompanyInput {
        name: payload.name,
        company_type: payload.company_type,
        email: payload.email,
        phone: payload.phone,
        timesheet: payload.timesheet_config.map(|config| TimesheetConfigInput {
            cycle: config.timesheet_cycle,
            approvals: config.approvals.into(),
        }),
        invoice: payload.invoice_config.map(ApprovalConfigInput::from),
    };
    let detail = repo.create(auth.tenant_id(), input).await?;

    info!(
        tenant_id = %auth.tenant_id(),
        employee_id = %auth.employee_id(),
        company_id = %detail.company.id,
        "Company created via API"
    );
    Ok(Envelope::created("Company created", detail.into()))
}

/// GET `/companies/{id}` - Company with its approval configurations.
async fn get_company(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Envelope<CompanyResponse>> {
    let repo = CompanyRepository::new((*state.db).clone());
    let detail = repo
        .find(auth.tenant_id(), id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Envelope::ok("Company fetched", detail.into()))
}

/// PATCH `/companies/{id}` - Update basic fields.
async fn update_company(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateCompanyRequest>,
) -> ApiResult<Envelope<CompanyResponse>> {
    let repo = CompanyRepository::new((*state.db).clone());
    let input = UpdateCompanyInput {
        name: payload.name,
        email: payload.email.map(Some),
        phone: payload.phone.map(Some),
        is_active: payload.is_active,
    };
    let detail = repo.update(auth.tenant_id(), id, input).await?;
    Ok(Envelope::ok("Company updated", detail.into()))
}

/// PUT `/companies/{id}/timesheet-config` - Replace cycle, merge approvals.
async fn update_timesheet_config(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<TimesheetConfigRequest>,
) -> ApiResult<Envelope<CompanyResponse>> {
    approval_pipeline(false).run(&payload.approvals, ApprovalContext::default())?;

    let repo = CompanyRepository::new((*state.db).clone());
    let input = TimesheetConfigInput {
        cycle: payload.timesheet_cycle,
        approvals: payload.approvals.into(),
    };
    let detail = repo.update_timesheet_config(auth.tenant_id(), id, input).await?;
    Ok(Envelope::ok("Timesheet configuration updated", detail.into()))
}

/// PUT `/companies/{id}/invoice-config` - Merge invoice approvals.
async fn update_invoice_config(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<ApprovalConfigRequest>,
) -> ApiResult<Envelope<CompanyResponse>> {
    approval_pipeline(false).run(&payload, ApprovalContext::default())?;

    let repo = CompanyRepository::new((*state.db).clone());
    let detail = repo
        .update_invoice_config(auth.tenant_id(), id, payload.into())
        .await?;
    Ok(Envelope::ok("Invoice configuration updated", detail.into()))
}

/// DELETE `/companies/{id}` - Soft delete.
async fn delete_company(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Envelope<()>> {
    let repo = CompanyRepository::new((*state.db).clone());
    repo.delete(auth.tenant_id(), id).await?;
    Ok(Envelope::message("Company deleted"))
}
