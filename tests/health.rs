mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use grocery_storefront_api::routes::build_app;
use tower::ServiceExt;

#[tokio::test]
async fn health_reports_unreachable_database() {
    let app = build_app(common::offline_state());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["data"]["database"], "unavailable");
}

#[tokio::test]
async fn health_ok_with_database() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };

    let response = build_app(state)
        .oneshot(Request::builder().uri("/api/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await?;
    let json: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "ok");
    Ok(())
}
