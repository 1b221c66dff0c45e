//! Document OCR proxy.

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::post,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use validator::Validate;

use staffdesk_core::employee::DocumentType;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::middleware::AuthUser;
use crate::ocr::{MAX_UPLOAD_BYTES, OcrRequest, UploadError, decoded_size};
use crate::response::Envelope;

/// Creates the OCR routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ocr/extract", post(extract))
        .layer(DefaultBodyLimit::max(REQUEST_BODY_LIMIT))
}

/// Encoded upload plus room for the other fields.
const REQUEST_BODY_LIMIT: usize = MAX_UPLOAD_BYTES / 3 * 4 + 64 * 1024;

/// Request body for an extraction.
#[derive(Debug, Deserialize, Validate)]
pub struct ExtractRequest {
    /// Passport or visa.
    pub document_type: DocumentType,
    /// Original file name.
    #[validate(length(min = 1, max = 255, message = "file_name must be 1-255 characters"))]
    pub file_name: String,
    /// File contents, standard base64.
    #[validate(length(min = 1, message = "content_base64 is required"))]
    pub content_base64: String,
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        let status = match err {
            UploadError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::InvalidEncoding | UploadError::Empty => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self::new(status, "INVALID_UPLOAD", err.to_string()).with_field("content_base64")
    }
}

/// POST `/ocr/extract` - Forward a scan to the OCR service.
async fn extract(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<ExtractRequest>,
) -> ApiResult<Envelope<Value>> {
    let size = decoded_size(&payload.content_base64)?;

    let request = OcrRequest {
        document_type: payload.document_type,
        file_name: payload.file_name,
        content_base64: payload.content_base64,
    };
    let extracted = state.ocr.extract(&request).await?;

    info!(
        tenant_id = %auth.tenant_id(),
        employee_id = %auth.employee_id(),
        bytes = size,
        "OCR extraction proxied"
    );
    Ok(Envelope::ok("Document extracted", extracted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_errors_point_at_content() {
        let err = ApiError::from(UploadError::TooLarge);
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.field(), Some("content_base64"));

        let err = ApiError::from(UploadError::InvalidEncoding);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "INVALID_UPLOAD");
    }
}
