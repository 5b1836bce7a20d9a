//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use super::contains_pattern;
use crate::domain::entities::{Link, LinkCounts, LinkPatch, NewLink};
use crate::domain::repositories::{LinkRepository, OwnerLinksQuery};
use crate::error::AppError;

const LINK_COLUMNS: &str =
    "id, slug, target_url, owner_id, expired_at, disabled, qr_options, created_at, updated_at";

pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let link = sqlx::query_as::<_, Link>(&format!(
            r#"
            INSERT INTO links (slug, target_url, owner_id, expired_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(&new_link.slug)
        .bind(&new_link.target_url)
        .bind(new_link.owner_id)
        .bind(new_link.expired_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let link = sqlx::query_as::<_, Link>(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError> {
        let link = sqlx::query_as::<_, Link>(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn count_by_owner(&self, owner_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn list_by_owner(&self, query: OwnerLinksQuery) -> Result<Vec<Link>, AppError> {
        let pattern = query.search.as_deref().map(contains_pattern);

        let links = sqlx::query_as::<_, Link>(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE owner_id = $1
              AND ($2::text IS NULL OR target_url ILIKE $2 OR slug ILIKE $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(query.owner_id)
        .bind(pattern)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(links)
    }

    async fn count_matching(
        &self,
        owner_id: i64,
        search: Option<String>,
    ) -> Result<i64, AppError> {
        let pattern = search.as_deref().map(contains_pattern);

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM links
            WHERE owner_id = $1
              AND ($2::text IS NULL OR target_url ILIKE $2 OR slug ILIKE $2)
            "#,
        )
        .bind(owner_id)
        .bind(pattern)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn counts_by_owner(
        &self,
        owner_id: i64,
        now: DateTime<Utc>,
    ) -> Result<LinkCounts, AppError> {
        let (total, active): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE NOT disabled AND expired_at > $2)
            FROM links
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .bind(now)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(LinkCounts {
            total,
            active,
            inactive: total - active,
        })
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<Option<Link>, AppError> {
        let (set_qr, qr_options) = match patch.qr_options {
            Some(value) => (true, value),
            None => (false, None),
        };

        let link = sqlx::query_as::<_, Link>(&format!(
            r#"
            UPDATE links
            SET target_url = COALESCE($2, target_url),
                disabled   = COALESCE($3, disabled),
                qr_options = CASE WHEN $4 THEN $5 ELSE qr_options END,
                expired_at = COALESCE($6, expired_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.target_url)
        .bind(patch.disabled)
        .bind(set_qr)
        .bind(qr_options)
        .bind(patch.expired_at)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired_anonymous(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE owner_id IS NULL AND expired_at <= $1")
            .bind(now)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn slugs_by_owner(&self, owner_id: i64) -> Result<Vec<String>, AppError> {
        let slugs = sqlx::query_scalar("SELECT slug FROM links WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(slugs)
    }
}
