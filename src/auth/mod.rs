use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

/// Marks which half of the token pair a JWT belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenUse {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub jti: Uuid,
    pub token_use: TokenUse,
    /// True only for access tokens minted directly from a login.
    /// Tokens obtained via refresh are not fresh.
    pub fresh: bool,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn access(user_id: i32, is_admin: bool, fresh: bool) -> Self {
        let now = Utc::now();
        let expiry_mins = config::config().security.access_token_expiry_mins;
        Self {
            sub: user_id,
            jti: Uuid::new_v4(),
            token_use: TokenUse::Access,
            fresh,
            is_admin,
            exp: (now + Duration::minutes(expiry_mins as i64)).timestamp(),
            iat: now.timestamp(),
        }
    }

    pub fn refresh(user_id: i32, is_admin: bool) -> Self {
        let now = Utc::now();
        let expiry_days = config::config().security.refresh_token_expiry_days;
        Self {
            sub: user_id,
            jti: Uuid::new_v4(),
            token_use: TokenUse::Refresh,
            fresh: false,
            is_admin,
            exp: (now + Duration::days(expiry_days as i64)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("{0}")]
    InvalidToken(String),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    encode_with_secret(claims, secret)
}

pub fn validate_jwt(token: &str) -> Result<Claims, AuthError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    decode_with_secret(token, secret)
}

fn encode_with_secret(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

fn decode_with_secret(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::InvalidToken(format!("Invalid JWT token: {}", e)))
}
