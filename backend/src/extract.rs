//! Request extractors whose rejections use the JSON error body
//!
//! axum's own `Json`, `Query` and `Path` reject with plain text. These
//! wrappers route the rejection through `AppError` so clients always get
//! `{success: false, error}` with HTTP 400.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query string
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::IntoResponse,
    };
    use shared::{CreateInboundRequest, SalesReturnRequest};

    fn json_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/returns/sales")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn missing_field_is_bad_request() {
        let result = tokio_test::block_on(AppJson::<SalesReturnRequest>::from_request(
            json_request(r#"{"sale_id":1}"#),
            &(),
        ));
        let err = result.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let body = err.to_response_body();
        assert!(!body.success);
        assert_eq!(body.code, "BAD_REQUEST");
        assert!(body.message_en.contains("reason"));
        assert!(body.error.starts_with("请求格式错误"));
    }

    #[test]
    fn mistyped_field_is_bad_request() {
        let result = tokio_test::block_on(AppJson::<CreateInboundRequest>::from_request(
            json_request(r#"{"medicine_id":1,"supplier_id":2,"quantity":"abc","unit_price":"1.00"}"#),
            &(),
        ));
        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_content_type_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/returns/sales")
            .body(Body::from(r#"{"sale_id":1,"reason":"过敏"}"#))
            .unwrap();
        let result =
            tokio_test::block_on(AppJson::<SalesReturnRequest>::from_request(request, &()));
        assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn well_formed_body_is_extracted() {
        let result = tokio_test::block_on(AppJson::<SalesReturnRequest>::from_request(
            json_request(r#"{"sale_id":1,"reason":"过敏退货"}"#),
            &(),
        ));
        let AppJson(input) = result.unwrap();
        assert_eq!(input.sale_id, 1);
    }

    #[test]
    fn malformed_query_is_bad_request() {
        let (mut parts, _) = Request::builder()
            .uri("/api/inbounds?page=abc")
            .body(())
            .unwrap()
            .into_parts();
        let result = tokio_test::block_on(AppQuery::<crate::handlers::ListQuery>::from_request_parts(
            &mut parts,
            &(),
        ));
        let body = result.unwrap_err().to_response_body();
        assert!(!body.success);
        assert_eq!(body.code, "BAD_REQUEST");
    }
}
