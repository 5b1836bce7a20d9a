//! Handlers for link management endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::links::{
    CreateLinkRequest, LinkCountsResponse, LinkListResponse, LinkResponse, UpdateLinkRequest,
};
use crate::api::dto::pagination::{ListQuery, PaginationMeta};
use crate::api::extractors::{CurrentUser, MaybeUser};
use crate::application::services::LinkStats;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// Signed-in callers get an owned link (7-character slug, counted against
/// their quota); anonymous callers get a 5-character slug that expires
/// sooner.
///
/// # Request Body
///
/// ```json
/// { "target_url": "https://example.com/page", "custom_slug": "docs" }
/// ```
///
/// # Errors
///
/// - `400` invalid URL or custom slug
/// - `403` quota exceeded (`error.code = "quota_exceeded"`)
/// - `409` custom slug already taken
pub async fn create_link_handler(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let owner_id = caller.map(|authenticated| authenticated.user.id);
    let custom_slug = payload
        .custom_slug
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let link = state
        .link_service
        .create_link(&payload.target_url, owner_id, custom_slug)
        .await?;

    let short_url = state.http.short_url(&link.slug);
    Ok((StatusCode::CREATED, Json(LinkResponse::new(link, short_url))))
}

/// Lists the caller's links, newest first.
///
/// # Endpoint
///
/// `GET /api/links?page=1&limit=10&search=docs`
pub async fn list_links_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<LinkListResponse>, AppError> {
    let page = query.page_request()?;

    let result = state
        .link_service
        .find_links_by_owner(current.id(), page, query.search)
        .await?;

    let items = result
        .items
        .into_iter()
        .map(|link| {
            let short_url = state.http.short_url(&link.slug);
            LinkResponse::new(link, short_url)
        })
        .collect();

    Ok(Json(LinkListResponse {
        items,
        pagination: PaginationMeta::new(page, result.total_matching),
        counts: LinkCountsResponse::from(result.counts),
    }))
}

/// Partially updates one of the caller's links.
///
/// # Endpoint
///
/// `PATCH /api/links/{id}`
///
/// # Errors
///
/// - `404` link does not exist
/// - `403` link belongs to someone else or is anonymous
pub async fn update_link_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(link_id): Path<i64>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .update_link(link_id, current.id(), payload.into())
        .await?;

    let short_url = state.http.short_url(&link.slug);
    Ok(Json(LinkResponse::new(link, short_url)))
}

/// Deletes one of the caller's links together with its clicks.
///
/// # Endpoint
///
/// `DELETE /api/links/{id}`
pub async fn delete_link_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(link_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete_link(link_id, current.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Click analytics for one of the caller's links.
///
/// # Endpoint
///
/// `GET /api/links/{id}/stats`
///
/// # Response
///
/// ```json
/// {
///   "link_id": 12,
///   "slug": "aB3xK9p",
///   "total_clicks": 42,
///   "daily": { "2026-03-01": 0, "2026-03-02": 5 },
///   "top_referrers": [{ "value": "direct", "count": 30 }],
///   "top_user_agents": [{ "value": "Mozilla/5.0", "count": 12 }]
/// }
/// ```
pub async fn link_stats_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(link_id): Path<i64>,
) -> Result<Json<LinkStats>, AppError> {
    let stats = state
        .stats_service
        .get_stats_for_link(link_id, current.id())
        .await?;

    Ok(Json(stats))
}
