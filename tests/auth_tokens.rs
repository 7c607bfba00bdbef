use chrono::Duration;
use grocery_storefront_api::{
    dto::auth::TokenKind,
    error::AppError,
    services::auth_service::{build_claims, decode_token, encode_token, hash_password, verify_password},
};
use uuid::Uuid;

const SECRET: &str = "test-secret";

#[test]
fn access_token_round_trip() {
    let user_id = Uuid::new_v4();
    let claims = build_claims(user_id, "customer", TokenKind::Access, Duration::minutes(15));
    let token = encode_token(SECRET, &claims).unwrap();

    let decoded = decode_token(SECRET, &token, TokenKind::Access).unwrap();
    assert_eq!(decoded.sub, user_id.to_string());
    assert_eq!(decoded.role, "customer");
    assert_eq!(decoded.jti, claims.jti);
}

#[test]
fn refresh_token_is_not_an_access_token() {
    let claims = build_claims(Uuid::new_v4(), "customer", TokenKind::Refresh, Duration::days(7));
    let token = encode_token(SECRET, &claims).unwrap();

    assert!(matches!(
        decode_token(SECRET, &token, TokenKind::Access),
        Err(AppError::Unauthorized(_))
    ));
    assert!(decode_token(SECRET, &token, TokenKind::Refresh).is_ok());
}

#[test]
fn wrong_secret_is_rejected() {
    let claims = build_claims(Uuid::new_v4(), "admin", TokenKind::Access, Duration::minutes(15));
    let token = encode_token(SECRET, &claims).unwrap();
    assert!(matches!(
        decode_token("another-secret", &token, TokenKind::Access),
        Err(AppError::Unauthorized(_))
    ));
}

#[test]
fn expired_token_is_rejected() {
    let claims = build_claims(Uuid::new_v4(), "customer", TokenKind::Access, Duration::minutes(-10));
    let token = encode_token(SECRET, &claims).unwrap();
    assert!(decode_token(SECRET, &token, TokenKind::Access).is_err());
}

#[test]
fn each_token_gets_its_own_id() {
    let user_id = Uuid::new_v4();
    let a = build_claims(user_id, "customer", TokenKind::Refresh, Duration::days(7));
    let b = build_claims(user_id, "customer", TokenKind::Refresh, Duration::days(7));
    assert_ne!(a.jti, b.jti);
}

#[test]
fn password_hash_verifies() {
    let hash = hash_password("correct horse battery").unwrap();
    assert_ne!(hash, "correct horse battery");
    assert!(verify_password("correct horse battery", &hash).unwrap());
    assert!(!verify_password("wrong password", &hash).unwrap());
}
