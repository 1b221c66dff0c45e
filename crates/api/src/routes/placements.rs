//! Placement routes: assignments, timesheet approval source and billing history.

use axum::{
    Router,
    extract::State,
    routing::{get, put},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use staffdesk_core::CoreError;
use staffdesk_core::approval::{ApprovalConfigInput, ApprovalConfigType, ApprovalLevelInput};
use staffdesk_core::placement::{BillingRates, PlacementError, validate_dates, validate_rates};
use staffdesk_core::validation::Pipeline;
use staffdesk_db::PlacementRepository;
use staffdesk_db::entities::{placement_billings, placements};
use staffdesk_db::repositories::{
    ApprovalConfigView, CreateBillingInput, CreatePlacementInput, PlacementDetail,
    PlacementFilter, PlacementTimesheetConfigInput, UpdatePlacementInput,
};

use super::page_request;
use crate::AppState;
use crate::dto::approval::{ApprovalConfigRequest, ApprovalContext, approval_pipeline};
use crate::dto::double_option;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::middleware::AuthUser;
use crate::response::Envelope;

/// Creates the placement routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/placements", get(list_placements).post(create_placement))
        .route(
            "/placements/{id}",
            get(get_placement).patch(update_placement),
        )
        .route(
            "/placements/{id}/timesheet-config",
            put(update_timesheet_config),
        )
        .route(
            "/placements/{id}/billings",
            get(list_billings).post(add_billing),
        )
}

/// Query parameters for listing placements.
#[derive(Debug, Deserialize)]
pub struct ListPlacementsQuery {
    /// Only placements of this employee.
    pub employee_id: Option<Uuid>,
    /// Only placements at this client.
    pub client_id: Option<Uuid>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    #[serde(alias = "perPage")]
    pub per_page: Option<u32>,
}

/// Request body for creating a placement.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlacementRequest {
    /// Placed employee.
    pub employee_id: Uuid,
    /// Client company.
    pub client_id: Uuid,
    /// Vendor company.
    pub vendor_id: Option<Uuid>,
    /// End-client company.
    pub end_client_id: Option<Uuid>,
    /// Role at the client.
    #[validate(length(min = 1, max = 255, message = "job_title must be 1-255 characters"))]
    pub job_title: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: Option<NaiveDate>,
    /// 1 tenant default, 2 inherit client, 3 custom.
    pub timesheet_approval_config_type: ApprovalConfigType,
    /// Levels for a custom configuration.
    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 approval levels are allowed"))]
    pub approvals: Vec<ApprovalLevelInput>,
    /// Placement-owned invoice approvals.
    #[validate(nested)]
    pub invoice_config: Option<ApprovalConfigRequest>,
}

/// Request body for updating a placement.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePlacementRequest {
    /// Role at the client.
    #[validate(length(min = 1, max = 255, message = "job_title must be 1-255 characters"))]
    pub job_title: Option<String>,
    /// Last day, `null` reopens the placement.
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
}

/// Request body for switching or editing timesheet approvals.
#[derive(Debug, Deserialize, Validate)]
pub struct PlacementTimesheetConfigRequest {
    /// 1 tenant default, 2 inherit client, 3 custom.
    pub timesheet_approval_config_type: ApprovalConfigType,
    /// Levels and deletions for a custom configuration.
    #[serde(flatten)]
    #[validate(nested)]
    pub approvals: ApprovalConfigRequest,
}

/// Request body for adding a billing rate.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBillingRequest {
    /// Rate billed to the client.
    pub bill_rate: Decimal,
    /// Overtime rate billed to the client.
    #[serde(default)]
    pub overtime_bill_rate: Decimal,
    /// Rate paid to the consultant.
    pub pay_rate: Decimal,
    /// First day the rates apply.
    pub effective_from: NaiveDate,
}

impl CreateBillingRequest {
    const fn rates(&self) -> BillingRates {
        BillingRates {
            bill_rate: self.bill_rate,
            overtime_bill_rate: self.overtime_bill_rate,
            pay_rate: self.pay_rate,
        }
    }
}

/// Billing period as returned by the API.
#[derive(Debug, Serialize)]
pub struct BillingResponse {
    /// Billing ID.
    pub id: Uuid,
    /// Rate billed to the client.
    pub bill_rate: Decimal,
    /// Overtime rate billed to the client.
    pub overtime_bill_rate: Decimal,
    /// Rate paid to the consultant.
    pub pay_rate: Decimal,
    /// Bill minus pay.
    pub margin: Decimal,
    /// First day the rates apply.
    pub effective_from: NaiveDate,
    /// Last day, open when absent.
    pub effective_to: Option<NaiveDate>,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
}

impl From<placement_billings::Model> for BillingResponse {
    fn from(b: placement_billings::Model) -> Self {
        Self {
            id: b.id,
            margin: b.bill_rate - b.pay_rate,
            bill_rate: b.bill_rate,
            overtime_bill_rate: b.overtime_bill_rate,
            pay_rate: b.pay_rate,
            effective_from: b.effective_from,
            effective_to: b.effective_to,
            created_at: b.created_at,
        }
    }
}

/// Placement as returned by the API.
#[derive(Debug, Serialize)]
pub struct PlacementResponse {
    /// Placement ID.
    pub id: Uuid,
    /// `PLC-` reference.
    pub reference_id: String,
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
    /// Last day.
    pub end_date: Option<NaiveDate>,
    /// 1 tenant default, 2 inherit client, 3 custom.
    pub timesheet_approval_config_type: i16,
    /// Timesheet approvals in effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timesheet_config: Option<ApprovalConfigView>,
    /// Invoice approvals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_config: Option<ApprovalConfigView>,
    /// Rates in force today.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_billing: Option<BillingResponse>,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last update time.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<placements::Model> for PlacementResponse {
    fn from(p: placements::Model) -> Self {
        Self {
            id: p.id,
            reference_id: p.reference_id,
            employee_id: p.employee_id,
            client_id: p.client_id,
            vendor_id: p.vendor_id,
            end_client_id: p.end_client_id,
            job_title: p.job_title,
            start_date: p.start_date,
            end_date: p.end_date,
            timesheet_approval_config_type: p.timesheet_approval_config_type,
            timesheet_config: None,
            invoice_config: None,
            current_billing: None,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<PlacementDetail> for PlacementResponse {
    fn from(detail: PlacementDetail) -> Self {
        Self {
            timesheet_config: detail.timesheet_config,
            invoice_config: detail.invoice_config,
            current_billing: detail.current_billing.map(BillingResponse::from),
            ..Self::from(detail.placement)
        }
    }
}

/// Ordered checks for a new placement.
fn create_pipeline<'a>() -> Pipeline<'a, CreatePlacementRequest, (), CoreError> {
    Pipeline::<'a, CreatePlacementRequest, (), CoreError>::new()
        .check("dates", |req: &CreatePlacementRequest| {
            validate_dates(req.start_date, req.end_date)?;
            Ok(())
        })
        .check("timesheet_approvals", |req| {
            if req.timesheet_approval_config_type != ApprovalConfigType::Custom {
                return Ok(());
            }
            if req.approvals.is_empty() {
                return Err(PlacementError::CustomApprovalsRequired.into());
            }
            let config = ApprovalConfigRequest {
                approvals: req.approvals.clone(),
                ..ApprovalConfigRequest::default()
            };
            approval_pipeline(true).run(&config, ApprovalContext::default())?;
            Ok(())
        })
        .check("invoice_approvals", |req| {
            if let Some(invoice) = &req.invoice_config {
                approval_pipeline(true).run(invoice, ApprovalContext::default())?;
            }
            Ok(())
        })
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::from(CoreError::from(PlacementError::NotFound(id)))
}

/// GET `/placements` - List placements.
async fn list_placements(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ListPlacementsQuery>,
) -> ApiResult<Envelope<Vec<PlacementResponse>>> {
    let repo = PlacementRepository::new((*state.db).clone());
    let filter = PlacementFilter {
        employee_id: query.employee_id,
        client_id: query.client_id,
    };
    let page = repo
        .list(auth.tenant_id(), &filter, &page_request(query.page, query.per_page))
        .await?;
    Ok(Envelope::page("Placements fetched", page.map(PlacementResponse::from)))
}

/// POST `/placements` - Create a placement.
async fn create_placement(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreatePlacementRequest>,
) -> ApiResult<Envelope<PlacementResponse>> {
    create_pipeline().run(&payload, ())?;

    let repo = PlacementRepository::new((*state.db).clone());
    let input = CreatePlacementInput {
        employee_id: payload.employee_id,
        client_id: payload.client_id,
        vendor_id: payload.vendor_id,
        end_client_id: payload.end_client_id,
        job_title: payload.job_title.trim().to_string(),
        start_date: payload.start_date,
        end_date: payload.end_date,
        timesheet_config_type: payload.timesheet_approval_config_type,
        timesheet_approvals: payload.approvals,
        invoice: payload.invoice_config.map(ApprovalConfigInput::from),
    };
    let detail = repo.create(auth.tenant_id(), input).await?;

    info!(
        tenant_id = %auth.tenant_id(),
        created_by = %auth.employee_id(),
        placement_id = %detail.placement.id,
        "Placement created via API"
    );
    Ok(Envelope::created("Placement created", detail.into()))
}

/// GET `/placements/{id}` - Placement with approvals and current rates.
async fn get_placement(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Envelope<PlacementResponse>> {
    let repo = PlacementRepository::new((*state.db).clone());
    let detail = repo
        .find(auth.tenant_id(), id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Envelope::ok("Placement fetched", detail.into()))
}

/// PATCH `/placements/{id}` - Update job title or end date.
async fn update_placement(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdatePlacementRequest>,
) -> ApiResult<Envelope<PlacementResponse>> {
    let repo = PlacementRepository::new((*state.db).clone());
    let detail = repo
        .update(
            auth.tenant_id(),
            id,
            UpdatePlacementInput {
                job_title: payload.job_title.map(|s| s.trim().to_string()),
                end_date: payload.end_date,
            },
        )
        .await?;
    Ok(Envelope::ok("Placement updated", detail.into()))
}

/// PUT `/placements/{id}/timesheet-config` - Switch source or edit custom levels.
async fn update_timesheet_config(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<PlacementTimesheetConfigRequest>,
) -> ApiResult<Envelope<PlacementResponse>> {
    approval_pipeline(false).run(&payload.approvals, ApprovalContext::default())?;

    let repo = PlacementRepository::new((*state.db).clone());
    let detail = repo
        .update_timesheet_config(
            auth.tenant_id(),
            id,
            PlacementTimesheetConfigInput {
                config_type: payload.timesheet_approval_config_type,
                approvals: payload.approvals.into(),
            },
        )
        .await?;
    Ok(Envelope::ok("Timesheet configuration updated", detail.into()))
}

/// GET `/placements/{id}/billings` - Billing history, newest first.
async fn list_billings(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Envelope<Vec<BillingResponse>>> {
    let repo = PlacementRepository::new((*state.db).clone());
    let billings = repo.list_billings(auth.tenant_id(), id).await?;
    Ok(Envelope::ok(
        "Billings fetched",
        billings.into_iter().map(BillingResponse::from).collect(),
    ))
}

/// POST `/placements/{id}/billings` - Add rates, closing the open period.
async fn add_billing(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreateBillingRequest>,
) -> ApiResult<Envelope<BillingResponse>> {
    let rates = payload.rates();
    validate_rates(&rates).map_err(CoreError::from)?;

    let repo = PlacementRepository::new((*state.db).clone());
    let billing = repo
        .add_billing(
            auth.tenant_id(),
            id,
            CreateBillingInput {
                rates,
                effective_from: payload.effective_from,
            },
        )
        .await?;
    Ok(Envelope::created("Billing added", billing.into()))
}
