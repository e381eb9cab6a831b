//! PostgreSQL-backed user table

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;

use crate::models::{NewUser, User};
use crate::repositories::UserTable;

/// User table stored in PostgreSQL
///
/// Each call checks a connection out of the pool and returns it when the
/// query completes.
#[derive(Clone)]
pub struct PgUserTable {
    pool: PgPool,
}

impl PgUserTable {
    /// Create a new PostgreSQL user table
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Apply pending schema migrations
pub async fn migrate(pool: &PgPool) -> DatabaseResult<()> {
    sqlx::migrate!()
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))
}

#[async_trait]
impl UserTable for PgUserTable {
    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn insert(&self, new_user: &NewUser) -> DatabaseResult<i32> {
        sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn update_credentials(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> DatabaseResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1, email = $2, updated_at = NOW()
            WHERE username = $3
            "#,
        )
        .bind(password_hash)
        .bind(email)
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        common::database::health_check(&self.pool).await
    }
}
