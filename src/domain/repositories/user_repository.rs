//! Repository trait for user accounts.

use crate::domain::entities::{NewUser, Role, User, UserSummary};
use crate::error::AppError;
use async_trait::async_trait;

/// Page request for the admin user listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListQuery {
    /// The requesting admin, never part of the listing.
    pub exclude_id: i64,
    pub offset: i64,
    pub limit: i64,
    /// Case-insensitive email substring.
    pub search: Option<String>,
}

/// Repository interface for user accounts.
///
/// Mutations that must not touch administrators (`set_blocked_unless_admin`,
/// `delete_unless_admin`) carry the role condition in the write itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the email is already registered.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Looks up a user by (lowercased) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn list(&self, query: UserListQuery) -> Result<Vec<UserSummary>, AppError>;

    async fn count_matching(
        &self,
        exclude_id: i64,
        search: Option<String>,
    ) -> Result<i64, AppError>;

    async fn count_all(&self) -> Result<i64, AppError>;

    /// Sets `is_blocked` only if the user exists and is not an admin.
    ///
    /// Returns `Ok(None)` when no row matched.
    async fn set_blocked_unless_admin(
        &self,
        id: i64,
        blocked: bool,
    ) -> Result<Option<User>, AppError>;

    async fn set_role(&self, id: i64, role: Role) -> Result<Option<User>, AppError>;

    async fn set_link_limit(&self, id: i64, link_limit: i32) -> Result<Option<User>, AppError>;

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, AppError>;

    /// Deletes the user (cascading to links, clicks and sessions) only if it
    /// is not an admin. Returns `false` when no row matched.
    async fn delete_unless_admin(&self, id: i64) -> Result<bool, AppError>;
}
