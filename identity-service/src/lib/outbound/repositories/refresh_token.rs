use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::errors::AuthError;
use crate::auth::models::RefreshToken;
use crate::auth::models::UserId;
use crate::auth::ports::RefreshTokenRepository;

pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    token: String,
    user_id: Uuid,
    expiry_date: DateTime<Utc>,
    revoked: bool,
}

impl From<RefreshTokenRow> for RefreshToken {
    fn from(row: RefreshTokenRow) -> Self {
        Self {
            id: row.id,
            token: row.token,
            user_id: UserId(row.user_id),
            expiry_date: row.expiry_date,
            revoked: row.revoked,
        }
    }
}

impl PostgresRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn replace_for_user(&self, token: RefreshToken) -> Result<RefreshToken, AuthError> {
        // One row per user, keyed by the unique user_id constraint. The
        // upsert replaces the previous token in a single statement, so
        // concurrent logins for the same user cannot leave two active rows.
        let row: RefreshTokenRow = sqlx::query_as(
            r#"
            INSERT INTO refresh_tokens (id, token, user_id, expiry_date, revoked)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET id = EXCLUDED.id,
                token = EXCLUDED.token,
                expiry_date = EXCLUDED.expiry_date,
                revoked = EXCLUDED.revoked
            RETURNING id, token, user_id, expiry_date, revoked
            "#,
        )
        .bind(token.id)
        .bind(&token.token)
        .bind(token.user_id.0)
        .bind(token.expiry_date)
        .bind(token.revoked)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?;

        Ok(row.into())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, AuthError> {
        let row: Option<RefreshTokenRow> = sqlx::query_as(
            r#"
            SELECT id, token, user_id, expiry_date, revoked
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?;

        Ok(row.map(RefreshToken::from))
    }

    async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        // Zero rows affected is fine: revocation is idempotent and unknown
        // tokens are a silent no-op.
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE token = $1
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?;

        Ok(())
    }
}
