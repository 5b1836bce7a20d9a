//! DTOs for the admin console.

use serde::{Deserialize, Serialize};

use super::auth::UserResponse;
use super::pagination::PaginationMeta;
use crate::domain::entities::UserSummary;

#[derive(Debug, Serialize)]
pub struct UserSummaryResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub link_count: i64,
}

impl From<&UserSummary> for UserSummaryResponse {
    fn from(summary: &UserSummary) -> Self {
        Self {
            user: UserResponse::from(&summary.user),
            link_count: summary.link_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub items: Vec<UserSummaryResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub is_blocked: bool,
}

/// `role` stays a string so an unknown value is a validation error from
/// the service rather than a body rejection.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLimitRequest {
    pub link_limit: i64,
}
