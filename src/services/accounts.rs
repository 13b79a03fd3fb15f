use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sqlx::PgPool;
use thiserror::Error;

use crate::database::models::User;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Username taken: {0}")]
    UsernameTaken(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Password hash error: {0}")]
    Hash(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// User registration, credential verification, and the identity→privilege
/// lookup that feeds the admin flag into freshly minted claims.
pub struct AccountService {
    pool: PgPool,
}

impl AccountService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<User, AccountError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AccountError::Hash(e.to_string()))?
            .to_string();

        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) \
             RETURNING id, username, password_hash, is_admin, created_at",
        )
        .bind(username)
        .bind(&hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AccountError::UsernameTaken(username.to_string())
            }
            _ => AccountError::Database(e),
        })
    }

    /// Verifies a username/password pair. Failure is always the same
    /// generic error so callers can't distinguish unknown users from bad
    /// passwords.
    pub async fn verify(&self, username: &str, password: &str) -> Result<User, AccountError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, is_admin, created_at \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AccountError::InvalidCredentials)?;

        let parsed =
            PasswordHash::new(&user.password_hash).map_err(|e| AccountError::Hash(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AccountError::InvalidCredentials)?;

        Ok(user)
    }

    /// Privilege lookup for claims minting. Replaces any hardcoded
    /// identity check with a read of the user row.
    pub async fn is_admin(&self, user_id: i32) -> Result<bool, AccountError> {
        let is_admin: Option<bool> =
            sqlx::query_scalar("SELECT is_admin FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        is_admin.ok_or(AccountError::InvalidCredentials)
    }
}
