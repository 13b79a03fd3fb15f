// Authentication endpoints: register, login, refresh, logout
use axum::{http::HeaderMap, http::StatusCode, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{generate_jwt, validate_jwt, Claims, TokenUse};
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::auth::{extract_bearer_token, AuthUser};
use crate::services::accounts::AccountService;
use crate::services::tokens::TokenService;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// POST /auth/register - Create a new user account
pub async fn register(
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let pool = DatabaseManager::pool().await?;
    let user = AccountService::new(pool)
        .register(payload.username.trim(), &payload.password)
        .await?;

    tracing::info!("registered user {}", user.username);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": user.id, "username": user.username })),
    ))
}

/// POST /auth/login - Verify credentials and issue a token pair.
/// The access token is fresh; the refresh token can only mint non-fresh
/// access tokens later.
pub async fn login(Json(payload): Json<CredentialsRequest>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let user = AccountService::new(pool)
        .verify(&payload.username, &payload.password)
        .await?;

    let access = Claims::access(user.id, user.is_admin, true);
    let refresh = Claims::refresh(user.id, user.is_admin);
    let expires_in = config::config().security.access_token_expiry_mins * 60;

    Ok(Json(json!({
        "access_token": generate_jwt(&access)?,
        "refresh_token": generate_jwt(&refresh)?,
        "expires_in": expires_in,
    })))
}

/// POST /auth/refresh - Exchange a refresh token for a non-fresh access
/// token. The admin flag is re-read from the user row so a privilege
/// change takes effect at the next refresh.
pub async fn refresh(headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    let token = extract_bearer_token(&headers)?;
    let claims = validate_jwt(&token)?;

    if claims.token_use != TokenUse::Refresh {
        return Err(ApiError::unauthorized("Refresh token required"));
    }

    let pool = DatabaseManager::pool().await?;
    if TokenService::new(pool.clone()).is_revoked(claims.jti).await? {
        return Err(ApiError::unauthorized("The token has been revoked"));
    }

    let is_admin = AccountService::new(pool).is_admin(claims.sub).await?;
    let access = Claims::access(claims.sub, is_admin, false);
    let expires_in = config::config().security.access_token_expiry_mins * 60;

    Ok(Json(json!({
        "access_token": generate_jwt(&access)?,
        "expires_in": expires_in,
    })))
}

/// POST /auth/logout - Revoke the presented access token's jti
pub async fn logout(auth: AuthUser) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    TokenService::new(pool).revoke(auth.jti).await?;

    tracing::info!("revoked token for user {}", auth.user_id);
    Ok(Json(json!({ "message": "Successfully logged out" })))
}
