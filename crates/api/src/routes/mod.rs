//! API route definitions.

use axum::{Router, middleware};

use staffdesk_shared::types::PageRequest;

use crate::{AppState, middleware::auth::auth_middleware};

pub mod approval_settings;
pub mod companies;
pub mod documents;
pub mod employees;
pub mod health;
pub mod ocr;
pub mod placements;

/// Builds a page request from optional query parameters.
pub(crate) fn page_request(page: Option<u32>, per_page: Option<u32>) -> PageRequest {
    let defaults = PageRequest::default();
    PageRequest {
        page: page.unwrap_or(defaults.page),
        per_page: per_page.unwrap_or(defaults.per_page),
    }
    .normalized()
}

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(companies::routes())
        .merge(employees::routes())
        .merge(documents::routes())
        .merge(approval_settings::routes())
        .merge(placements::routes())
        .merge(ocr::routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use sea_orm::DatabaseConnection;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use uuid::Uuid;

    use staffdesk_shared::{JwtService, JwtSettings, OcrConfig, TokenKind};

    use crate::create_router;
    use crate::ocr::OcrClient;

    fn jwt_with_secret(secret: &str) -> JwtService {
        JwtService::new(&JwtSettings {
            secret: secret.into(),
            access_token_expiry_secs: 900,
            refresh_token_expiry_secs: 604_800,
        })
    }

    fn jwt() -> JwtService {
        jwt_with_secret("router-test-secret")
    }

    fn app() -> Router {
        create_router(AppState {
            db: Arc::new(DatabaseConnection::Disconnected),
            jwt_service: Arc::new(jwt()),
            ocr: Arc::new(OcrClient::new(&OcrConfig::default()).unwrap()),
        })
    }

    fn bearer() -> String {
        let token = jwt()
            .issue(TokenKind::Access, Uuid::new_v4(), Uuid::new_v4(), "admin")
            .unwrap();
        format!("Bearer {token}")
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, bearer())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_page_request_defaults_and_clamps() {
        let page = page_request(None, None);
        assert_eq!((page.page, page.per_page), (1, 20));
        let page = page_request(Some(0), Some(1000));
        assert_eq!((page.page, page.per_page), (1, 100));
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (status, body) = send(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["data"]["status"], "healthy");
    }

    #[tokio::test]
    async fn test_missing_token_is_enveloped() {
        let (status, body) = send(
            Request::builder()
                .uri("/api/v1/companies")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["error"]["code"], "MISSING_TOKEN");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_foreign_token_is_rejected() {
        let token = jwt_with_secret("another-secret")
            .issue(TokenKind::Access, Uuid::new_v4(), Uuid::new_v4(), "admin")
            .unwrap();
        let (status, body) = send(
            Request::builder()
                .uri("/api/v1/employees")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_field_rules_run_before_storage() {
        let (status, body) = send(post_json(
            "/api/v1/companies",
            &json!({ "name": "", "company_type": "client" }),
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["field"], "name");
    }

    #[tokio::test]
    async fn test_rank_order_reported_before_storage() {
        let approver = Uuid::new_v4();
        let (status, body) = send(post_json(
            "/api/v1/companies",
            &json!({
                "name": "Globex",
                "company_type": "client",
                "timesheet_config": {
                    "timesheet_cycle": "weekly",
                    "approvals": [
                        { "rank": 1, "approver_ids": [approver] },
                        { "rank": 1, "approver_ids": [approver] }
                    ]
                }
            }),
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "DUPLICATE_RANK");
    }

    #[tokio::test]
    async fn test_placement_dates_checked_first() {
        let (status, body) = send(post_json(
            "/api/v1/placements",
            &json!({
                "employee_id": Uuid::new_v4(),
                "client_id": Uuid::new_v4(),
                "job_title": "QA Lead",
                "start_date": "2025-06-01",
                "end_date": "2025-05-01",
                "timesheet_approval_config_type": 1
            }),
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "END_BEFORE_START");
    }

    #[tokio::test]
    async fn test_malformed_json_is_enveloped() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/employees")
            .header(header::AUTHORIZATION, bearer())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_PAYLOAD");
    }

    #[tokio::test]
    async fn test_unknown_module_is_not_found() {
        let (status, body) = send(
            Request::builder()
                .uri("/api/v1/approval-settings/global/payroll")
                .header(header::AUTHORIZATION, bearer())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "UNKNOWN_APPROVAL_MODULE");
    }

    #[tokio::test]
    async fn test_undecodable_upload_is_rejected() {
        let (status, body) = send(post_json(
            "/api/v1/ocr/extract",
            &json!({
                "document_type": "passport",
                "file_name": "scan.png",
                "content_base64": "%%%"
            }),
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_UPLOAD");
        assert_eq!(body["error"]["field"], "content_base64");
    }
}
