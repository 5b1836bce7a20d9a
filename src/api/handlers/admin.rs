//! Handlers for the admin console. Routed behind the admin guard.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::api::dto::admin::{
    UpdateLimitRequest, UpdateRoleRequest, UpdateStatusRequest, UserListResponse,
    UserSummaryResponse,
};
use crate::api::dto::auth::UserResponse;
use crate::api::dto::pagination::{ListQuery, PaginationMeta};
use crate::api::extractors::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

/// Lists every user except the calling admin.
///
/// # Endpoint
///
/// `GET /api/admin/users?page=1&limit=10&search=example.com`
pub async fn list_users_handler(
    State(state): State<AppState>,
    admin: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    let page = query.page_request()?;

    let result = state
        .admin_service
        .get_all_users(admin.id(), page, query.search)
        .await?;

    Ok(Json(UserListResponse {
        items: result.items.iter().map(UserSummaryResponse::from).collect(),
        pagination: PaginationMeta::new(page, result.total_matching),
    }))
}

/// Blocks or unblocks a user.
///
/// # Endpoint
///
/// `PATCH /api/admin/users/{id}/status` with `{"is_blocked": true}`
///
/// # Errors
///
/// - `400` target is the caller
/// - `403` target is an admin
/// - `404` target does not exist
pub async fn update_status_handler(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .admin_service
        .update_user_status(user_id, admin.id(), payload.is_blocked)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// `PATCH /api/admin/users/{id}/role` with `{"role": "ADMIN"}`
pub async fn change_role_handler(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .admin_service
        .change_user_role(user_id, admin.id(), &payload.role)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// `PATCH /api/admin/users/{id}/limit` with `{"link_limit": 50}`
pub async fn update_limit_handler(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateLimitRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .admin_service
        .update_user_limit(user_id, admin.id(), payload.link_limit)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// Deletes a regular user with all their links, clicks and sessions.
///
/// # Endpoint
///
/// `DELETE /api/admin/users/{id}`
pub async fn delete_user_handler(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.admin_service.delete_user(user_id, admin.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
