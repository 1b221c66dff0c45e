//! Client for the third-party document OCR service.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use staffdesk_core::employee::DocumentType;
use staffdesk_shared::{AppError, OcrConfig};

/// Largest decoded upload accepted by the proxy.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Payload forwarded to `{base_url}/v1/extract`.
#[derive(Debug, Clone, Serialize)]
pub struct OcrRequest {
    /// Passport or visa.
    pub document_type: DocumentType,
    /// Original file name.
    pub file_name: String,
    /// File contents, standard base64.
    pub content_base64: String,
}

/// Errors decoding an upload before it is forwarded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// Not valid base64.
    #[error("content_base64 is not valid base64")]
    InvalidEncoding,
    /// Decoded content is empty.
    #[error("content_base64 is empty")]
    Empty,
    /// Decoded content is over [`MAX_UPLOAD_BYTES`].
    #[error("file is larger than {MAX_UPLOAD_BYTES} bytes")]
    TooLarge,
}

/// Returns the decoded size of a base64 upload.
///
/// # Errors
///
/// Returns an [`UploadError`] for undecodable, empty or oversized content.
pub fn decoded_size(content_base64: &str) -> Result<usize, UploadError> {
    let bytes = STANDARD
        .decode(content_base64.trim())
        .map_err(|_| UploadError::InvalidEncoding)?;
    match bytes.len() {
        0 => Err(UploadError::Empty),
        n if n > MAX_UPLOAD_BYTES => Err(UploadError::TooLarge),
        n => Ok(n),
    }
}

/// OCR service client.
#[derive(Debug, Clone)]
pub struct OcrClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OcrClient {
    /// Builds a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(config: &OcrConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Sends a document for extraction and returns the service's JSON.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ExternalService` on transport failures, non-2xx
    /// responses, or an unreadable body.
    pub async fn extract(&self, request: &OcrRequest) -> Result<Value, AppError> {
        let url = format!("{}/v1/extract", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, %url, "OCR request failed");
                AppError::ExternalService(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, %url, "OCR service returned an error");
            return Err(AppError::ExternalService(format!(
                "OCR service responded with {status}"
            )));
        }

        let body = response.json::<Value>().await.map_err(|e| {
            error!(error = %e, "OCR response was not JSON");
            AppError::ExternalService(e.to_string())
        })?;
        info!(document_type = %request.document_type.as_str(), file_name = %request.file_name, "document extracted");
        Ok(body)
    }
}
