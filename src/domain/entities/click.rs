//! Click entity representing a single redirect event.

use chrono::{DateTime, Utc};

/// A persisted click on a link. Append-only.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Click {
    pub id: i64,
    pub link_id: i64,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input data for recording a click.
///
/// The timestamp is set by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClick {
    pub link_id: i64,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

/// Number of clicks on a single UTC day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyClicks {
    pub day: chrono::NaiveDate,
    pub clicks: i64,
}

/// A grouped value (referrer, user agent) with its frequency.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: i64,
}
