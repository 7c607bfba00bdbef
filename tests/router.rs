mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use grocery_storefront_api::{dto::auth::TokenKind, models::Role, routes::build_app};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response: Response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn unknown_route_uses_envelope() {
    let app = build_app(common::offline_state());
    let request = Request::builder().uri("/api/nope").body(Body::empty()).unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["data"]["path"], "/api/nope");
}

#[tokio::test]
async fn cart_requires_token() {
    let app = build_app(common::offline_state());
    let request = Request::builder().uri("/api/cart").body(Body::empty()).unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn refresh_token_cannot_call_api() {
    let state = common::offline_state();
    let auth = common::bearer(&state, Uuid::new_v4(), Role::Customer, TokenKind::Refresh);
    let request = Request::builder()
        .uri("/api/orders")
        .header(header::AUTHORIZATION, auth)
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(build_app(state), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn customers_cannot_reach_inventory() {
    let state = common::offline_state();
    let auth = common::bearer(&state, Uuid::new_v4(), Role::Customer, TokenKind::Access);
    let request = Request::builder()
        .uri("/api/inventory/low-stock")
        .header(header::AUTHORIZATION, auth)
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(build_app(state), request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn checkout_validation_lists_fields() {
    let state = common::offline_state();
    let auth = common::bearer(&state, Uuid::new_v4(), Role::Customer, TokenKind::Access);
    let request = json_request(
        "POST",
        "/api/orders",
        Some(&auth),
        json!({
            "items": [],
            "delivery_address_id": Uuid::new_v4(),
            "payment_method": "cash_on_delivery"
        }),
    );

    let (status, body) = send(build_app(state), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["data"][0]["field"], "items");
}

#[tokio::test]
async fn register_validation_happens_before_database() {
    let app = build_app(common::offline_state());
    let request = json_request(
        "POST",
        "/api/auth/register",
        None,
        json!({
            "email": "nope",
            "password": "12345678",
            "first_name": "Ana",
            "last_name": "García"
        }),
    );

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"][0]["field"], "email");
}

#[tokio::test]
async fn mistyped_body_uses_envelope() {
    let state = common::offline_state();
    let auth = common::bearer(&state, Uuid::new_v4(), Role::Customer, TokenKind::Access);
    let request = json_request(
        "POST",
        "/api/orders",
        Some(&auth),
        json!({
            "items": [{ "product_id": "not-a-uuid", "quantity": "two" }],
            "delivery_address_id": Uuid::new_v4(),
            "payment_method": "cash_on_delivery"
        }),
    );

    let (status, body) = send(build_app(state), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Validation failed");
    let field = body["data"][0]["field"].as_str().unwrap_or_default();
    assert!(field.starts_with("items[0]"), "unexpected field {field}");
}

#[tokio::test]
async fn malformed_json_uses_envelope() {
    let state = common::offline_state();
    let auth = common::bearer(&state, Uuid::new_v4(), Role::Customer, TokenKind::Access);
    let request = Request::builder()
        .method("POST")
        .uri("/api/cart/items")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, auth)
        .body(Body::from("{\"product_id\":"))
        .unwrap();

    let (status, body) = send(build_app(state), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn bad_path_id_uses_envelope() {
    let state = common::offline_state();
    let auth = common::bearer(&state, Uuid::new_v4(), Role::Customer, TokenKind::Access);
    let request = Request::builder()
        .method("DELETE")
        .uri("/api/cart/items/not-a-uuid")
        .header(header::AUTHORIZATION, auth)
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(build_app(state), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["data"][0]["field"], "path");
}

#[tokio::test]
async fn bad_query_uses_envelope() {
    let app = build_app(common::offline_state());
    let request = Request::builder()
        .uri("/api/products?page=abc")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["data"][0]["field"], "query");
}
