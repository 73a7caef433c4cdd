use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::errors::AuthError;
use crate::auth::models::Role;
use crate::auth::ports::RoleRepository;

pub struct PostgresRoleRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn get_or_create(&self, name: &str) -> Result<Role, AuthError> {
        // Single-statement upsert: concurrent first use of a role name
        // resolves to one row, never two. The no-op DO UPDATE makes
        // RETURNING yield the existing row instead of nothing.
        let row: RoleRow = sqlx::query_as(
            r#"
            INSERT INTO roles (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?;

        Ok(Role {
            id: row.id,
            name: row.name,
        })
    }
}
