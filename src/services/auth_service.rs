use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::{
        Validate,
        auth::{
            AuthResponse, Claims, LoginRequest, RefreshRequest, RegisterRequest, TokenKind,
            TokenPair,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, User},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn build_claims(user_id: Uuid, role: &str, typ: TokenKind, ttl: Duration) -> Claims {
    let now = Utc::now();
    Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        typ,
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp() as usize,
        exp: (now + ttl).timestamp() as usize,
    }
}

pub fn encode_token(secret: &str, claims: &Claims) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Decode and verify a token, rejecting tokens of the other kind.
pub fn decode_token(secret: &str, token: &str, expected: TokenKind) -> AppResult<Claims> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    if decoded.claims.typ != expected {
        return Err(AppError::Unauthorized("Wrong token type".into()));
    }
    Ok(decoded.claims)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn issue_tokens(state: &AppState, user: &User) -> AppResult<TokenPair> {
    let config = &state.config;
    let access_ttl = Duration::minutes(config.access_token_ttl_minutes);
    let refresh_ttl = Duration::days(config.refresh_token_ttl_days);

    let access = build_claims(user.id, &user.role, TokenKind::Access, access_ttl);
    let refresh = build_claims(user.id, &user.role, TokenKind::Refresh, refresh_ttl);

    let refresh_id = Uuid::parse_str(&refresh.jti)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    sqlx::query("INSERT INTO refresh_tokens (id, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(refresh_id)
        .bind(user.id)
        .bind(Utc::now() + refresh_ttl)
        .execute(&state.pool)
        .await?;

    Ok(TokenPair {
        access_token: encode_token(&config.jwt_secret, &access)?,
        refresh_token: encode_token(&config.jwt_secret, &refresh)?,
        token_type: "Bearer".to_string(),
        expires_in: access_ttl.num_seconds(),
    })
}

pub async fn revoke_refresh_tokens(pool: &DbPool, user_id: Uuid) -> AppResult<u64> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    payload.validate()?;
    let email = normalize_email(&payload.email);

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;

    if exist.is_some() {
        return Err(AppError::Conflict("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, first_name, last_name, phone, role)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email.as_str())
    .bind(password_hash)
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(payload.phone.as_deref().map(str::trim))
    .bind(Role::Customer.as_str())
    .fetch_one(&state.pool)
    .await?;

    let tokens = issue_tokens(state, &user).await?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        AuthResponse { user, tokens },
        None,
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    payload.validate()?;
    let email = normalize_email(&payload.email);

    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthorized("Invalid email or password".into())),
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let tokens = issue_tokens(state, &user).await?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        AuthResponse { user, tokens },
        Some(Meta::empty()),
    ))
}

/// Rotate a refresh token: the presented token is revoked and a new pair issued.
pub async fn refresh_session(
    state: &AppState,
    payload: RefreshRequest,
) -> AppResult<ApiResponse<TokenPair>> {
    let claims = decode_token(
        &state.config.jwt_secret,
        &payload.refresh_token,
        TokenKind::Refresh,
    )?;
    let (token_id, user_id) = match (Uuid::parse_str(&claims.jti), Uuid::parse_str(&claims.sub)) {
        (Ok(jti), Ok(sub)) => (jti, sub),
        _ => return Err(AppError::Unauthorized("Invalid or expired token".into())),
    };

    let revoked: Option<(Uuid,)> = sqlx::query_as(
        r#"
        UPDATE refresh_tokens
        SET revoked_at = NOW()
        WHERE id = $1 AND user_id = $2 AND revoked_at IS NULL AND expires_at > NOW()
        RETURNING id
        "#,
    )
    .bind(token_id)
    .bind(user_id)
    .fetch_optional(&state.pool)
    .await?;

    if revoked.is_none() {
        return Err(AppError::Unauthorized("Refresh token revoked or expired".into()));
    }

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await?;
    let user = user.ok_or_else(|| AppError::Unauthorized("User no longer exists".into()))?;

    let tokens = issue_tokens(state, &user).await?;
    Ok(ApiResponse::success("Token refreshed", tokens, None))
}

pub async fn logout(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<serde_json::Value>> {
    let revoked = revoke_refresh_tokens(&state.pool, user.user_id).await?;
    tracing::debug!(user_id = %user.user_id, revoked, "refresh tokens revoked");

    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_logout",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged out",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
