use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// Monotonic blocklist of revoked token identifiers. Entries are inserted
/// idempotently and never removed, so a revoked jti stays revoked.
pub struct TokenService {
    pool: PgPool,
}

impl TokenService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotent: revoking the same jti twice is a no-op. Safe under
    /// concurrent writers thanks to the primary-key-guarded insert.
    pub async fn revoke(&self, jti: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO blocked_tokens (jti) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(jti)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn is_revoked(&self, jti: Uuid) -> Result<bool, DatabaseError> {
        let found: Option<Uuid> =
            sqlx::query_scalar("SELECT jti FROM blocked_tokens WHERE jti = $1")
                .bind(jti)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }
}
