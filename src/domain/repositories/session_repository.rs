//! Repository trait for login sessions.

use crate::domain::entities::{NewSession, Session};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, new_session: NewSession) -> Result<Session, AppError>;

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, AppError>;

    async fn delete_by_token_hash(&self, token_hash: &str) -> Result<bool, AppError>;

    /// Deletes every session of a user, optionally keeping one.
    async fn delete_for_user(
        &self,
        user_id: i64,
        keep_token_hash: Option<String>,
    ) -> Result<u64, AppError>;

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}
