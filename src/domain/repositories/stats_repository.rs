//! Repository trait for click recording and analytics queries.

use crate::domain::entities::{Click, DailyClicks, NewClick, ValueCount};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for click tracking and statistics.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgStatsRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Records a new click.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the link no longer exists or on database errors.
    async fn record_click(&self, new_click: NewClick) -> Result<Click, AppError>;

    /// All-time click count for a link.
    async fn count_clicks(&self, link_id: i64) -> Result<i64, AppError>;

    /// Clicks grouped by UTC day, for days at or after `since`. Days without
    /// clicks are absent.
    async fn daily_clicks(
        &self,
        link_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyClicks>, AppError>;

    /// Most frequent referrers, `NULL` grouped as `"direct"`.
    async fn top_referrers(&self, link_id: i64, limit: i64) -> Result<Vec<ValueCount>, AppError>;

    /// Most frequent user agents, `NULL` grouped as `"unknown"`.
    async fn top_user_agents(&self, link_id: i64, limit: i64)
    -> Result<Vec<ValueCount>, AppError>;
}
