//! Handler for short link redirects.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;

use crate::api::extractors::ClientMeta;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a slug to its target URL.
///
/// # Endpoint
///
/// `GET /r/{slug}`
///
/// # Request Flow
///
/// 1. Look up the slug (Redis cache first, then database)
/// 2. Reject disabled and expired links
/// 3. Queue a click event for the background worker (never awaited)
/// 4. Return `302 Found`
///
/// # Errors
///
/// Returns 404 Not Found if the slug is unknown, disabled or expired.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ClientMeta(client): ClientMeta,
) -> Result<impl IntoResponse, AppError> {
    let target = state
        .link_service
        .get_and_record_click(&slug, client)
        .await?
        .ok_or_else(|| AppError::not_found("Link not found", json!({ "slug": slug })))?;

    Ok((StatusCode::FOUND, [(header::LOCATION, target)]))
}
