mod common;

use grocery_storefront_api::{
    dto::auth::{LoginRequest, RefreshRequest, RegisterRequest},
    error::AppError,
    middleware::auth::AuthUser,
    services::auth_service,
};
use uuid::Uuid;

#[tokio::test]
async fn register_login_refresh_logout() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let email = format!("Cliente.{}@Example.com", Uuid::new_v4().simple());

    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            email: email.clone(),
            password: "supersecreto".into(),
            first_name: "Lucía".into(),
            last_name: "Núñez".into(),
            phone: None,
        },
    )
    .await?
    .data
    .expect("auth");
    assert_eq!(registered.user.email, email.to_lowercase());
    assert_eq!(registered.user.role, "customer");

    let duplicate = auth_service::register_user(
        &state,
        RegisterRequest {
            email: email.to_uppercase(),
            password: "supersecreto".into(),
            first_name: "Otra".into(),
            last_name: "Persona".into(),
            phone: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(duplicate, AppError::Conflict(_)));

    let bad_login = auth_service::login_user(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "incorrecto".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(bad_login, AppError::Unauthorized(_)));

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "supersecreto".into(),
        },
    )
    .await?
    .data
    .expect("auth");

    let rotated = auth_service::refresh_session(
        &state,
        RefreshRequest {
            refresh_token: login.tokens.refresh_token.clone(),
        },
    )
    .await?
    .data
    .expect("tokens");
    assert_ne!(rotated.refresh_token, login.tokens.refresh_token);

    // The rotated-out token is single use.
    let reused = auth_service::refresh_session(
        &state,
        RefreshRequest {
            refresh_token: login.tokens.refresh_token,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(reused, AppError::Unauthorized(_)));

    let user = AuthUser {
        user_id: login.user.id,
        role: login.user.role.clone(),
    };
    auth_service::logout(&state, &user).await?;

    let after_logout = auth_service::refresh_session(
        &state,
        RefreshRequest {
            refresh_token: rotated.refresh_token,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(after_logout, AppError::Unauthorized(_)));
    Ok(())
}
