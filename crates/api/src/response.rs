//! Response envelope shared by every endpoint.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use staffdesk_shared::types::{PageMeta, PageResponse};

/// Error details carried by a failed response.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: String,
    /// Request field the error refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// `{ statusCode, message, data?, error?, pagination? }`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// HTTP status code, repeated in the body.
    pub status_code: u16,
    /// Human-readable summary.
    pub message: String,
    /// Payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    /// Paging metadata for list endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageMeta>,
}

impl<T: Serialize> Envelope<T> {
    /// 200 with a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::OK, message, data)
    }

    /// 201 with the created resource.
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::CREATED, message, data)
    }

    fn with_status(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            data: Some(data),
            error: None,
            pagination: None,
        }
    }
}

impl<T: Serialize> Envelope<Vec<T>> {
    /// 200 with one page of results.
    pub fn page(message: impl Into<String>, page: PageResponse<T>) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            message: message.into(),
            data: Some(page.data),
            error: None,
            pagination: Some(page.meta),
        }
    }
}

impl Envelope<()> {
    /// Success without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            message: message.into(),
            data: None,
            error: None,
            pagination: None,
        }
    }

    /// Failure with an error code.
    pub fn failure(status: StatusCode, message: impl Into<String>, error: ErrorBody) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            data: None,
            error: Some(error),
            pagination: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use staffdesk_shared::types::PageRequest;

    #[test]
    fn test_absent_fields_are_omitted() {
        let body = serde_json::to_value(Envelope::ok("Company fetched", json!({"id": 1}))).unwrap();
        assert_eq!(
            body,
            json!({ "statusCode": 200, "message": "Company fetched", "data": { "id": 1 } })
        );
    }

    #[test]
    fn test_page_carries_pagination() {
        let request = PageRequest {
            page: 2,
            per_page: 2,
        };
        let page = PageResponse::new(vec![1, 2], &request, 5);
        let body = serde_json::to_value(Envelope::page("Companies fetched", page)).unwrap();
        assert_eq!(body["pagination"]["page"], 2);
        assert_eq!(body["pagination"]["perPage"], 2);
        assert_eq!(body["pagination"]["total"], 5);
        assert_eq!(body["pagination"]["totalPages"], 3);
        assert_eq!(body["data"], json!([1, 2]));
    }

    #[test]
    fn test_failure_has_error_and_no_data() {
        let body = serde_json::to_value(Envelope::failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Approval rank order is invalid",
            ErrorBody {
                code: "RANK_ORDER_INVALID".into(),
                field: Some("approvals".into()),
            },
        ))
        .unwrap();
        assert_eq!(body["statusCode"], 422);
        assert_eq!(body["error"]["code"], "RANK_ORDER_INVALID");
        assert_eq!(body["error"]["field"], "approvals");
        assert!(body.get("data").is_none());
    }
}
