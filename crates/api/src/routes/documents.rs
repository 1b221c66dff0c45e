//! Employee passport and visa documents.

use axum::{Router, extract::State, routing::get};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use staffdesk_core::employee::{DocumentType, is_expired};
use staffdesk_db::EmployeeRepository;
use staffdesk_db::entities::employee_documents;
use staffdesk_db::repositories::{CreateDocumentInput, UpdateDocumentInput};

use crate::AppState;
use crate::error::ApiResult;
use crate::extract::{ApiPath, ValidatedJson};
use crate::middleware::AuthUser;
use crate::response::Envelope;

/// Creates the document routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/employees/{id}/documents",
            get(list_documents).post(create_document),
        )
        .route(
            "/employees/{id}/documents/{doc_id}",
            axum::routing::patch(update_document).delete(delete_document),
        )
}

/// Request body for adding a document.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDocumentRequest {
    /// `passport` or `visa`.
    pub document_type: DocumentType,
    /// Document number.
    #[validate(length(min = 1, max = 64, message = "document_number must be 1-64 characters"))]
    pub document_number: String,
    /// Issuing country.
    #[validate(length(min = 2, max = 64, message = "issuing_country must be 2-64 characters"))]
    pub issuing_country: String,
    /// Visa category, required for visas.
    #[validate(length(max = 64, message = "visa_type must be at most 64 characters"))]
    pub visa_type: Option<String>,
    /// Issue date.
    pub issued_on: NaiveDate,
    /// Expiry date.
    pub expires_on: NaiveDate,
}

/// Request body for updating a document.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDocumentRequest {
    /// Document number.
    #[validate(length(min = 1, max = 64, message = "document_number must be 1-64 characters"))]
    pub document_number: Option<String>,
    /// Issuing country.
    #[validate(length(min = 2, max = 64, message = "issuing_country must be 2-64 characters"))]
    pub issuing_country: Option<String>,
    /// Visa category.
    #[validate(length(max = 64, message = "visa_type must be at most 64 characters"))]
    pub visa_type: Option<String>,
    /// Issue date.
    pub issued_on: Option<NaiveDate>,
    /// Expiry date.
    pub expires_on: Option<NaiveDate>,
}

/// Document as returned by the API.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    /// Document ID.
    pub id: Uuid,
    /// Owning employee.
    pub employee_id: Uuid,
    /// `passport` or `visa`.
    pub document_type: String,
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
    /// Expired as of today.
    pub is_expired: bool,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last update time.
    pub updated_at: DateTime<FixedOffset>,
}

impl DocumentResponse {
    fn from_model(d: employee_documents::Model, today: NaiveDate) -> Self {
        Self {
            is_expired: is_expired(d.expires_on, today),
            id: d.id,
            employee_id: d.employee_id,
            document_type: d.document_type,
            document_number: d.document_number,
            issuing_country: d.issuing_country,
            visa_type: d.visa_type,
            issued_on: d.issued_on,
            expires_on: d.expires_on,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

impl From<employee_documents::Model> for DocumentResponse {
    fn from(d: employee_documents::Model) -> Self {
        Self::from_model(d, Utc::now().date_naive())
    }
}

/// GET `/employees/{id}/documents`
async fn list_documents(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Envelope<Vec<DocumentResponse>>> {
    let repo = EmployeeRepository::new((*state.db).clone());
    let documents = repo.list_documents(auth.tenant_id(), id).await?;
    Ok(Envelope::ok(
        "Documents fetched",
        documents.into_iter().map(DocumentResponse::from).collect(),
    ))
}

/// POST `/employees/{id}/documents`
async fn create_document(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreateDocumentRequest>,
) -> ApiResult<Envelope<DocumentResponse>> {
    let repo = EmployeeRepository::new((*state.db).clone());
    let document = repo
        .create_document(
            auth.tenant_id(),
            id,
            CreateDocumentInput {
                document_type: payload.document_type,
                document_number: payload.document_number.trim().to_string(),
                issuing_country: payload.issuing_country.trim().to_string(),
                visa_type: payload.visa_type,
                issued_on: payload.issued_on,
                expires_on: payload.expires_on,
            },
        )
        .await?;

    info!(
        tenant_id = %auth.tenant_id(),
        employee_id = %id,
        document_id = %document.id,
        "Document added via API"
    );
    Ok(Envelope::created("Document created", document.into()))
}

/// PATCH `/employees/{id}/documents/{doc_id}`
async fn update_document(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((id, doc_id)): ApiPath<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<UpdateDocumentRequest>,
) -> ApiResult<Envelope<DocumentResponse>> {
    let repo = EmployeeRepository::new((*state.db).clone());
    let document = repo
        .update_document(
            auth.tenant_id(),
            id,
            doc_id,
            UpdateDocumentInput {
                document_number: payload.document_number,
                issuing_country: payload.issuing_country,
                visa_type: payload.visa_type.map(Some),
                issued_on: payload.issued_on,
                expires_on: payload.expires_on,
            },
        )
        .await?;
    Ok(Envelope::ok("Document updated", document.into()))
}

/// DELETE `/employees/{id}/documents/{doc_id}`
async fn delete_document(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((id, doc_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Envelope<()>> {
    let repo = EmployeeRepository::new((*state.db).clone());
    repo.delete_document(auth.tenant_id(), id, doc_id).await?;
    Ok(Envelope::message("Document deleted"))
}
