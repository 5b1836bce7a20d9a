//! Link entity representing a slug → target URL mapping.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A shortened link.
///
/// `owner_id == None` marks an anonymous link. A link redirects only while it
/// is active: not disabled and not yet expired.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Link {
    pub id: i64,
    pub slug: String,
    pub target_url: String,
    pub owner_id: Option<i64>,
    pub expired_at: DateTime<Utc>,
    pub disabled: bool,
    pub qr_options: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Link {
    /// Returns true if the link is past its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expired_at <= now
    }

    /// Returns true if the link can be followed right now.
    pub fn is_active(&self) -> bool {
        !self.disabled && !self.is_expired()
    }

    pub fn is_anonymous(&self) -> bool {
        self.owner_id.is_none()
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == Some(user_id)
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub slug: String,
    pub target_url: String,
    pub owner_id: Option<i64>,
    pub expired_at: DateTime<Utc>,
}

/// Partial update for an existing link, already resolved by the service.
///
/// `None` fields are left unchanged. `qr_options: Some(None)` clears the
/// options; `Some(Some(v))` replaces them.
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub target_url: Option<String>,
    pub disabled: Option<bool>,
    pub qr_options: Option<Option<Value>>,
    pub expired_at: Option<DateTime<Utc>>,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.target_url.is_none()
            && self.disabled.is_none()
            && self.qr_options.is_none()
            && self.expired_at.is_none()
    }
}

/// Per-owner link counters, independent of any search filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCounts {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
}

#[cfg(test)]
pub(crate) fn sample_link(id: i64, slug: &str, owner_id: Option<i64>) -> Link {
    let now = Utc::now();
    Link {
        id,
        slug: slug.to_string(),
        target_url: "https://example.com/".to_string(),
        owner_id,
        expired_at: now + chrono::Duration::days(7),
        disabled: false,
        qr_options: None,
        created_at: now,
        updated_at: now,
    }
}
