//! Cache service trait and cached entry type.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::Link;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    #[error("Cache operation error: {0}")]
    OperationError(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Everything the redirect path needs to know about a slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedLink {
    pub link_id: i64,
    pub target_url: String,
    pub expired_at: DateTime<Utc>,
    pub disabled: bool,
}

impl CachedLink {
    /// Redirect target if the entry is still usable at `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> Option<&str> {
        (!self.disabled && self.expired_at > now).then_some(self.target_url.as_str())
    }

    /// Seconds to keep the entry: never beyond the link's own expiry.
    pub fn ttl_seconds(&self, max_ttl: u64, now: DateTime<Utc>) -> u64 {
        let remaining = (self.expired_at - now).num_seconds().max(0) as u64;
        remaining.min(max_ttl)
    }
}

impl From<&Link> for CachedLink {
    fn from(link: &Link) -> Self {
        Self {
            link_id: link.id,
            target_url: link.target_url.clone(),
            expired_at: link.expired_at,
            disabled: link.disabled,
        }
    }
}

/// Slug lookup cache.
///
/// Implementations must be thread-safe and fail open: backend errors are
/// logged and reported as misses so lookups fall back to the database.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns the cached entry for `slug`, `None` on miss or backend error.
    async fn get_link(&self, slug: &str) -> CacheResult<Option<CachedLink>>;

    /// Stores an entry for `ttl_seconds`.
    async fn set_link(&self, slug: &str, entry: &CachedLink, ttl_seconds: u64)
    -> CacheResult<()>;

    /// Removes a cached entry after the link changed or was deleted.
    async fn invalidate(&self, slug: &str) -> CacheResult<()>;

    async fn health_check(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(expired_at: DateTime<Utc>, disabled: bool) -> CachedLink {
        CachedLink {
            link_id: 1,
            target_url: "https://example.com/".to_string(),
            expired_at,
            disabled,
        }
    }

    #[test]
    fn test_resolve() {
        let now = Utc::now();
        assert_eq!(
            entry(now + Duration::hours(1), false).resolve(now),
            Some("https://example.com/")
        );
        assert_eq!(entry(now + Duration::hours(1), true).resolve(now), None);
        assert_eq!(entry(now, false).resolve(now), None);
    }

    #[test]
    fn test_ttl_capped_by_expiry() {
        let now = Utc::now();
        assert_eq!(entry(now + Duration::seconds(90), false).ttl_seconds(3600, now), 90);
        assert_eq!(entry(now + Duration::days(7), false).ttl_seconds(3600, now), 3600);
        assert_eq!(entry(now - Duration::seconds(5), false).ttl_seconds(3600, now), 0);
    }

    #[test]
    fn test_json_shape() {
        let now = Utc::now();
        let value = serde_json::to_value(entry(now, false)).unwrap();
        assert_eq!(value["link_id"], 1);
        assert_eq!(value["target_url"], "https://example.com/");
        assert_eq!(value["disabled"], false);
    }
}
