use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use identity_cell::identity_routes;
use shared_utils::test_utils::TestConfig;

fn app() -> Router {
    identity_routes(TestConfig::default().to_arc())
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_national_id_endpoint() {
    let (status, body) = post_json(app(), "/national-id/validate", json!({ "value": "12.345.678-5" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "valid": true }));

    let (_, body) = post_json(app(), "/national-id/validate", json!({ "value": "12345678-0" })).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "Invalid national ID");
}

#[tokio::test]
async fn test_format_endpoint() {
    let (status, body) = post_json(app(), "/national-id/format", json!({ "value": "10000013k" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["formatted"], "10.000.013-K");
    assert_eq!(body["cleaned"], "10000013K");
}

#[tokio::test]
async fn test_phone_endpoint_uses_configured_prefix() {
    let (_, body) = post_json(app(), "/phone/validate", json!({ "value": "9 1234 5678" })).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["normalized"], "+56912345678");
}

#[tokio::test]
async fn test_birth_date_endpoint() {
    let (_, body) = post_json(
        app(),
        "/birth-date/validate",
        json!({ "birth_date": "1990-05-04", "timezone": "UTC" }),
    )
    .await;
    assert_eq!(body["valid"], true);
    assert!(body["age"].as_i64().unwrap() >= 36);

    let (_, body) = post_json(app(), "/birth-date/validate", json!({ "birth_date": "05/04/1990" })).await;
    assert_eq!(body["valid"], false);
    assert!(body.get("age").is_none());
}

#[tokio::test]
async fn test_password_endpoint() {
    let (_, body) = post_json(app(), "/password/strength", json!({ "value": "abc12345" })).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["strength"], "media");
    assert_eq!(body["requirements"]["has_uppercase"], false);

    let (_, body) = post_json(app(), "/password/strength", json!({ "value": "abc" })).await;
    assert_eq!(body["strength"], "debil");
}

#[tokio::test]
async fn test_file_endpoint() {
    let (_, body) = post_json(
        app(),
        "/file/validate",
        json!({
            "file": { "name": "orden.pdf", "size_bytes": 1536, "mime_type": "application/pdf" },
            "allowed_types": ["image/*", "application/pdf"]
        }),
    )
    .await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["size"], "1.5 KB");

    let (_, body) = post_json(
        app(),
        "/file/validate",
        json!({ "file": null, "field_label": "Medical order" }),
    )
    .await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "Medical order is required");
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/email/validate")
                .header("content-type", "application/json")
                .body(Body::from("{\"email\": 1}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
