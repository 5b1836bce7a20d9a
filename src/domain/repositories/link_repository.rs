//! Repository trait for link data access.

use crate::domain::entities::{Link, LinkCounts, LinkPatch, NewLink};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Page request over one owner's links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerLinksQuery {
    pub owner_id: i64,
    pub offset: i64,
    pub limit: i64,
    /// Case-insensitive substring matched against target URL or slug.
    pub search: Option<String>,
}

/// Repository interface for managing links.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the slug is already taken.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError>;

    /// Counts every link of an owner, disabled and expired ones included.
    async fn count_by_owner(&self, owner_id: i64) -> Result<i64, AppError>;

    /// Lists one page of an owner's links, newest first.
    async fn list_by_owner(&self, query: OwnerLinksQuery) -> Result<Vec<Link>, AppError>;

    /// Counts an owner's links matching the optional search filter.
    async fn count_matching(&self, owner_id: i64, search: Option<String>)
    -> Result<i64, AppError>;

    /// Total/active/inactive counters for an owner as of `now`.
    async fn counts_by_owner(
        &self,
        owner_id: i64,
        now: DateTime<Utc>,
    ) -> Result<LinkCounts, AppError>;

    /// Applies a patch. Returns `Ok(None)` if the link does not exist.
    async fn update(&self, id: i64, patch: LinkPatch) -> Result<Option<Link>, AppError>;

    /// Deletes a link and its clicks. Returns `false` if nothing was deleted.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Deletes anonymous links whose expiry is at or before `now`.
    async fn delete_expired_anonymous(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    /// Slugs of every link owned by a user.
    async fn slugs_by_owner(&self, owner_id: i64) -> Result<Vec<String>, AppError>;
}
