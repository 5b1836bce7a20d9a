//! PostgreSQL implementation of statistics repository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Click, DailyClicks, NewClick, ValueCount};
use crate::domain::repositories::StatsRepository;
use crate::error::AppError;

/// PostgreSQL repository for click tracking and analytics.
///
/// Aggregations are plain `GROUP BY` queries over the `clicks` table, served
/// by the `(link_id, created_at)` index.
pub struct PgStatsRepository {
    pool: Arc<PgPool>,
}

impl PgStatsRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn top_values(
        &self,
        column: &str,
        fallback: &str,
        link_id: i64,
        limit: i64,
    ) -> Result<Vec<ValueCount>, AppError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(&format!(
            r#"
            SELECT COALESCE({column}, $3) AS value, COUNT(*) AS count
            FROM clicks
            WHERE link_id = $1
            GROUP BY 1
            ORDER BY 2 DESC, 1 ASC
            LIMIT $2
            "#
        ))
        .bind(link_id)
        .bind(limit)
        .bind(fallback)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(value, count)| ValueCount { value, count })
            .collect())
    }
}

#[async_trait]
impl StatsRepository for PgStatsRepository {
    async fn record_click(&self, new_click: NewClick) -> Result<Click, AppError> {
        let click = sqlx::query_as::<_, Click>(
            r#"
            INSERT INTO clicks (link_id, ip, user_agent, referrer, country, city)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, link_id, ip, user_agent, referrer, country, city, created_at
            "#,
        )
        .bind(new_click.link_id)
        .bind(new_click.ip)
        .bind(new_click.user_agent)
        .bind(new_click.referrer)
        .bind(new_click.country)
        .bind(new_click.city)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(click)
    }

    async fn count_clicks(&self, link_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clicks WHERE link_id = $1")
            .bind(link_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn daily_clicks(
        &self,
        link_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyClicks>, AppError> {
        let rows: Vec<(NaiveDate, i64)> = sqlx::query_as(
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS clicks
            FROM clicks
            WHERE link_id = $1 AND created_at >= $2
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(link_id)
        .bind(since)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(day, clicks)| DailyClicks { day, clicks })
            .collect())
    }

    async fn top_referrers(&self, link_id: i64, limit: i64) -> Result<Vec<ValueCount>, AppError> {
        self.top_values("referrer", "direct", link_id, limit).await
    }

    async fn top_user_agents(
        &self,
        link_id: i64,
        limit: i64,
    ) -> Result<Vec<ValueCount>, AppError> {
        self.top_values("user_agent", "unknown", link_id, limit)
            .await
    }
}
