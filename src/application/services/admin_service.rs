//! User management for administrators.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::application::pagination::PageRequest;
use crate::domain::entities::{Role, User, UserSummary};
use crate::domain::repositories::{
    LinkRepository, SessionRepository, UserListQuery, UserRepository,
};
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;

/// One page of the admin user list.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub items: Vec<UserSummary>,
    pub total_matching: i64,
}

/// Service behind the admin console.
///
/// Every mutation first rejects acting on oneself, then loads the target.
/// Status changes and deletes are additionally conditional on the target
/// still having the `USER` role when the write runs, so a promotion racing
/// with the check surfaces as [`AppError::Forbidden`] instead of touching an
/// admin.
pub struct AdminService {
    users: Arc<dyn UserRepository>,
    links: Arc<dyn LinkRepository>,
    sessions: Arc<dyn SessionRepository>,
    cache: Arc<dyn CacheService>,
}

fn ensure_not_self(target_id: i64, admin_id: i64, action: &str) -> Result<(), AppError> {
    if target_id == admin_id {
        return Err(AppError::bad_request(
            format!("Cannot change own {action}"),
            json!({ "id": target_id }),
        ));
    }
    Ok(())
}

fn user_not_found(id: i64) -> AppError {
    AppError::not_found("User not found", json!({ "id": id }))
}

fn peer_admin(action: &str) -> AppError {
    AppError::forbidden(format!("Cannot {action} another admin"), json!({}))
}

impl AdminService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        links: Arc<dyn LinkRepository>,
        sessions: Arc<dyn SessionRepository>,
        cache: Arc<dyn CacheService>,
    ) -> Self {
        Self {
            users,
            links,
            sessions,
            cache,
        }
    }

    async fn load_target(&self, target_id: i64) -> Result<User, AppError> {
        self.users
            .find_by_id(target_id)
            .await?
            .ok_or_else(|| user_not_found(target_id))
    }

    /// Lists users other than the calling admin, newest first.
    ///
    /// `search` is a case-insensitive substring of the email.
    pub async fn get_all_users(
        &self,
        admin_id: i64,
        page: PageRequest,
        search: Option<String>,
    ) -> Result<UserPage, AppError> {
        let search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let items = self
            .users
            .list(UserListQuery {
                exclude_id: admin_id,
                offset: page.offset(),
                limit: page.limit(),
                search: search.clone(),
            })
            .await?;
        let total_matching = self.users.count_matching(admin_id, search).await?;

        Ok(UserPage {
            items,
            total_matching,
        })
    }

    /// Blocks or unblocks a regular user. Blocking revokes their sessions.
    pub async fn update_user_status(
        &self,
        target_id: i64,
        admin_id: i64,
        blocked: bool,
    ) -> Result<User, AppError> {
        ensure_not_self(target_id, admin_id, "status")?;

        let target = self.load_target(target_id).await?;
        if target.is_admin() {
            return Err(peer_admin("change status of"));
        }

        let user = self
            .users
            .set_blocked_unless_admin(target_id, blocked)
            .await?
            .ok_or_else(|| peer_admin("change status of"))?;

        if blocked {
            let revoked = self.sessions.delete_for_user(target_id, None).await?;
            info!(target_id, admin_id, revoked, "User blocked");
        } else {
            info!(target_id, admin_id, "User unblocked");
        }

        Ok(user)
    }

    /// Deletes a regular user together with their links and clicks.
    pub async fn delete_user(&self, target_id: i64, admin_id: i64) -> Result<(), AppError> {
        ensure_not_self(target_id, admin_id, "account")?;

        let target = self.load_target(target_id).await?;
        if target.is_admin() {
            return Err(peer_admin("delete"));
        }

        let slugs = self.links.slugs_by_owner(target_id).await?;

        if !self.users.delete_unless_admin(target_id).await? {
            return Err(peer_admin("delete"));
        }

        for slug in &slugs {
            if let Err(e) = self.cache.invalidate(slug).await {
                warn!(slug, error = %e, "Cache invalidation failed");
            }
        }

        info!(target_id, admin_id, links = slugs.len(), "User deleted");
        Ok(())
    }

    /// Sets a user's role.
    ///
    /// `role` is the raw `ADMIN`/`USER` string from the request.
    pub async fn change_user_role(
        &self,
        target_id: i64,
        admin_id: i64,
        role: &str,
    ) -> Result<User, AppError> {
        ensure_not_self(target_id, admin_id, "role")?;

        let role: Role = role.parse().map_err(|reason: String| {
            AppError::bad_request("Invalid role", json!({ "reason": reason }))
        })?;

        let user = self
            .users
            .set_role(target_id, role)
            .await?
            .ok_or_else(|| user_not_found(target_id))?;

        info!(target_id, admin_id, role = %role, "User role changed");
        Ok(user)
    }

    /// Sets a user's link quota.
    pub async fn update_user_limit(
        &self,
        target_id: i64,
        admin_id: i64,
        link_limit: i64,
    ) -> Result<User, AppError> {
        let link_limit = i32::try_from(link_limit)
            .ok()
            .filter(|limit| *limit >= 0)
            .ok_or_else(|| {
                AppError::bad_request(
                    "Link limit must be a non-negative integer",
                    json!({ "link_limit": link_limit }),
                )
            })?;

        let user = self
            .users
            .set_link_limit(target_id, link_limit)
            .await?
            .ok_or_else(|| user_not_found(target_id))?;

        info!(target_id, admin_id, link_limit, "User link limit changed");
        Ok(user)
    }

    /// Number of registered accounts. Doubles as the database health probe.
    pub async fn count_users(&self) -> Result<i64, AppError> {
        self.users.count_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::user::sample_user;
    use crate::domain::repositories::{
        MockLinkRepository, MockSessionRepository, MockUserRepository,
    };
    use crate::infrastructure::cache::MockCacheService;
    use mockall::predicate::eq;

    struct Mocks {
        users: MockUserRepository,
        links: MockLinkRepository,
        sessions: MockSessionRepository,
        cache: MockCacheService,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                users: MockUserRepository::new(),
                links: MockLinkRepository::new(),
                sessions: MockSessionRepository::new(),
                cache: MockCacheService::new(),
            }
        }

        fn service(self) -> AdminService {
            AdminService::new(
                Arc::new(self.users),
                Arc::new(self.links),
                Arc::new(self.sessions),
                Arc::new(self.cache),
            )
        }
    }

    #[tokio::test]
    async fn test_cannot_change_own_status() {
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_id().never();
        mocks.users.expect_set_blocked_unless_admin().never();
        let service = mocks.service();

        let err = service.update_user_status(1, 1, true).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(err.to_string(), "Cannot change own status");
    }

    #[tokio::test]
    async fn test_cannot_block_another_admin() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_user(id, Role::Admin))));
        mocks.users.expect_set_blocked_unless_admin().never();
        let service = mocks.service();

        let err = service.update_user_status(2, 1, true).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_status_of_missing_user() {
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_id().returning(|_| Ok(None));
        let service = mocks.service();

        let err = service.update_user_status(2, 1, true).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_block_revokes_sessions() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_user(id, Role::User))));
        mocks
            .users
            .expect_set_blocked_unless_admin()
            .with(eq(2), eq(true))
            .returning(|id, blocked| {
                let mut user = sample_user(id, Role::User);
                user.is_blocked = blocked;
                Ok(Some(user))
            });
        mocks
            .sessions
            .expect_delete_for_user()
            .with(eq(2), eq(None::<String>))
            .times(1)
            .returning(|_, _| Ok(2));
        let service = mocks.service();

        let user = service.update_user_status(2, 1, true).await.unwrap();
        assert!(user.is_blocked);
    }

    #[tokio::test]
    async fn test_unblock_keeps_sessions() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_user(id, Role::User))));
        mocks
            .users
            .expect_set_blocked_unless_admin()
            .returning(|id, _| Ok(Some(sample_user(id, Role::User))));
        mocks.sessions.expect_delete_for_user().never();
        let service = mocks.service();

        assert!(service.update_user_status(2, 1, false).await.is_ok());
    }

    #[tokio::test]
    async fn test_promotion_race_turns_into_forbidden() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_user(id, Role::User))));
        mocks
            .users
            .expect_set_blocked_unless_admin()
            .returning(|_, _| Ok(None));
        let service = mocks.service();

        let err = service.update_user_status(2, 1, true).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_delete_other_admin_is_forbidden() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_user(id, Role::Admin))));
        mocks.users.expect_delete_unless_admin().never();
        let service = mocks.service();

        let err = service.delete_user(2, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_cannot_delete_self() {
        let service = Mocks::new().service();
        let err = service.delete_user(1, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_delete_user_invalidates_cached_slugs() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_user(id, Role::User))));
        mocks
            .links
            .expect_slugs_by_owner()
            .returning(|_| Ok(vec!["abc1234".to_string(), "xyz7890".to_string()]));
        mocks
            .users
            .expect_delete_unless_admin()
            .with(eq(2))
            .times(1)
            .returning(|_| Ok(true));
        mocks
            .cache
            .expect_invalidate()
            .times(2)
            .returning(|_| Ok(()));
        let service = mocks.service();

        assert!(service.delete_user(2, 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_change_role() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_set_role()
            .with(eq(2), eq(Role::Admin))
            .returning(|id, role| Ok(Some(sample_user(id, role))));
        let service = mocks.service();

        let user = service.change_user_role(2, 1, "ADMIN").await.unwrap();
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn test_change_role_rejects_unknown_role_and_self() {
        let mut mocks = Mocks::new();
        mocks.users.expect_set_role().never();
        let service = mocks.service();

        assert!(matches!(
            service.change_user_role(2, 1, "ROOT").await.unwrap_err(),
            AppError::Validation { .. }
        ));
        assert!(matches!(
            service.change_user_role(1, 1, "USER").await.unwrap_err(),
            AppError::Validation { .. }
        ));
    }

    #[tokio::test]
    async fn test_limit_must_be_non_negative() {
        let mut mocks = Mocks::new();
        mocks.users.expect_set_link_limit().never();
        let service = mocks.service();

        let err = service.update_user_limit(2, 1, -1).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_limit_of_missing_user() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_set_link_limit()
            .with(eq(2), eq(0))
            .returning(|_, _| Ok(None));
        let service = mocks.service();

        let err = service.update_user_limit(2, 1, 0).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
