use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use uuid::Uuid;

use crate::auth::{validate_jwt, Claims, TokenUse};
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::services::tokens::TokenService;

/// Authenticated user context extracted from a validated access token.
///
/// Handlers opt into authentication by taking this extractor: it pulls the
/// bearer token, validates signature and expiry, and rejects tokens whose
/// jti is on the blocklist.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i32,
    pub jti: Uuid,
    pub fresh: bool,
    pub is_admin: bool,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            jti: claims.jti,
            fresh: claims.fresh,
            is_admin: claims.is_admin,
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let claims = validate_jwt(&token)?;

        if claims.token_use != TokenUse::Access {
            return Err(ApiError::unauthorized("Access token required"));
        }

        // Blocklist membership is the one stateful check: once a jti is
        // recorded the token is permanently invalid.
        let pool = DatabaseManager::pool().await?;
        if TokenService::new(pool).is_revoked(claims.jti).await? {
            return Err(ApiError::unauthorized("The token has been revoked"));
        }

        Ok(AuthUser::from(claims))
    }
}

/// Extract a bearer token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
        Some(_) => Err(ApiError::unauthorized("Empty bearer token")),
        None => Err(ApiError::unauthorized(
            "Authorization header must use Bearer token format",
        )),
    }
}

/// Mutating endpoints require a token minted directly from a login, not
/// one obtained through the refresh endpoint.
pub fn require_fresh(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.fresh {
        Ok(())
    } else {
        Err(ApiError::unauthorized("A fresh token is required"))
    }
}

/// Deletion endpoints are restricted to administrators.
pub fn require_admin(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.is_admin {
        Ok(())
    } else {
        Err(ApiError::forbidden("Admin privilege required"))
    }
}
