//! Click analytics for owned links.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;

use crate::application::services::link_service::ensure_owned;
use crate::domain::entities::ValueCount;
use crate::domain::repositories::{LinkRepository, StatsRepository};
use crate::error::AppError;

/// Days covered by the daily breakdown, today included.
pub const DAILY_WINDOW_DAYS: u64 = 7;
pub const TOP_REFERRERS: i64 = 10;
pub const TOP_USER_AGENTS: i64 = 5;

/// Aggregated analytics for one link.
#[derive(Debug, Clone, Serialize)]
pub struct LinkStats {
    pub link_id: i64,
    pub slug: String,
    pub total_clicks: i64,
    /// `YYYY-MM-DD` (UTC) to clicks, every day of the window present.
    pub daily: BTreeMap<String, i64>,
    pub top_referrers: Vec<ValueCount>,
    pub top_user_agents: Vec<ValueCount>,
}

/// Service for reading click analytics.
///
/// Totals and top lists cover all clicks ever recorded; the daily map covers
/// the trailing seven days.
pub struct StatsService {
    links: Arc<dyn LinkRepository>,
    stats: Arc<dyn StatsRepository>,
}

impl StatsService {
    pub fn new(links: Arc<dyn LinkRepository>, stats: Arc<dyn StatsRepository>) -> Self {
        Self { links, stats }
    }

    /// Returns analytics for a link owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist and
    /// [`AppError::Forbidden`] if it belongs to someone else.
    pub async fn get_stats_for_link(
        &self,
        link_id: i64,
        owner_id: i64,
    ) -> Result<LinkStats, AppError> {
        let link = ensure_owned(self.links.find_by_id(link_id).await?, link_id, owner_id)?;

        let today = Utc::now().date_naive();
        let first_day = window_start(today);
        let since = first_day.and_time(chrono::NaiveTime::MIN).and_utc();

        let total_clicks = self.stats.count_clicks(link_id).await?;
        let daily_rows = self.stats.daily_clicks(link_id, since).await?;
        let top_referrers = self.stats.top_referrers(link_id, TOP_REFERRERS).await?;
        let top_user_agents = self.stats.top_user_agents(link_id, TOP_USER_AGENTS).await?;

        let daily = fill_days(
            first_day,
            today,
            daily_rows.into_iter().map(|row| (row.day, row.clicks)),
        );

        Ok(LinkStats {
            link_id,
            slug: link.slug,
            total_clicks,
            daily,
            top_referrers,
            top_user_agents,
        })
    }
}

fn window_start(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_days(Days::new(DAILY_WINDOW_DAYS - 1))
        .unwrap_or(today)
}

/// Zero-filled day map from `first` to `last` inclusive.
fn fill_days(
    first: NaiveDate,
    last: NaiveDate,
    counts: impl IntoIterator<Item = (NaiveDate, i64)>,
) -> BTreeMap<String, i64> {
    let mut daily: BTreeMap<String, i64> = first
        .iter_days()
        .take_while(|day| *day <= last)
        .map(|day| (day.format("%Y-%m-%d").to_string(), 0))
        .collect();

    for (day, clicks) in counts {
        if let Some(slot) = daily.get_mut(&day.format("%Y-%m-%d").to_string()) {
            *slot += clicks;
        }
    }

    daily
}
