//! PostgreSQL implementation of user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use super::contains_pattern;
use crate::domain::entities::{NewUser, Role, User, UserSummary};
use crate::domain::repositories::{UserListQuery, UserRepository};
use crate::error::AppError;

const USER_COLUMNS: &str =
    "id, email, password_hash, provider, role, is_blocked, link_limit, created_at, updated_at";

/// Raw `users` row; role and provider are stored as text.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: Option<String>,
    provider: String,
    role: String,
    is_blocked: bool,
    link_limit: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserSummaryRow {
    #[sqlx(flatten)]
    user: UserRow,
    link_count: i64,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = move |reason: String| {
            AppError::internal("Corrupt user row", json!({ "id": id, "reason": reason }))
        };

        Ok(User {
            id: row.id,
            provider: row.provider.parse().map_err(corrupt)?,
            role: row.role.parse().map_err(corrupt)?,
            email: row.email,
            password_hash: row.password_hash,
            is_blocked: row.is_blocked,
            link_limit: row.link_limit,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_user(row: Option<UserRow>) -> Result<Option<User>, AppError> {
    row.map(User::try_from).transpose()
}

pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, password_hash, provider, role, link_limit)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.provider.as_str())
        .bind(new_user.role.as_str())
        .bind(new_user.link_limit)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        into_user(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        into_user(row)
    }

    async fn list(&self, query: UserListQuery) -> Result<Vec<UserSummary>, AppError> {
        let pattern = query.search.as_deref().map(contains_pattern);

        let rows = sqlx::query_as::<_, UserSummaryRow>(
            r#"
            SELECT
                u.id, u.email, u.password_hash, u.provider, u.role, u.is_blocked,
                u.link_limit, u.created_at, u.updated_at,
                (SELECT COUNT(*) FROM links l WHERE l.owner_id = u.id) AS link_count
            FROM users u
            WHERE u.id <> $1
              AND ($2::text IS NULL OR u.email ILIKE $2)
            ORDER BY u.created_at DESC, u.id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.exclude_id)
        .bind(pattern)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(UserSummary {
                    user: row.user.try_into()?,
                    link_count: row.link_count,
                })
            })
            .collect()
    }

    async fn count_matching(
        &self,
        exclude_id: i64,
        search: Option<String>,
    ) -> Result<i64, AppError> {
        let pattern = search.as_deref().map(contains_pattern);

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE id <> $1 AND ($2::text IS NULL OR email ILIKE $2)",
        )
        .bind(exclude_id)
        .bind(pattern)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn count_all(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn set_blocked_unless_admin(
        &self,
        id: i64,
        blocked: bool,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET is_blocked = $2, updated_at = NOW()
            WHERE id = $1 AND role = 'USER'
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(blocked)
        .fetch_optional(self.pool.as_ref())
        .await?;

        into_user(row)
    }

    async fn set_role(&self, id: i64, role: Role) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(self.pool.as_ref())
        .await?;

        into_user(row)
    }

    async fn set_link_limit(&self, id: i64, link_limit: i32) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET link_limit = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(link_limit)
        .fetch_optional(self.pool.as_ref())
        .await?;

        into_user(row)
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_unless_admin(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND role = 'USER'")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
