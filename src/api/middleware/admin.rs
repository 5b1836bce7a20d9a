//! Admin-only route guard.

use axum::{extract::Request, middleware::Next, response::Response};
use serde_json::json;

use crate::application::services::Authenticated;
use crate::error::AppError;

/// Lets the request through only for a signed-in `ADMIN`.
///
/// Must run after [`super::session::layer`].
///
/// # Errors
///
/// - `401 Unauthorized` without a valid session
/// - `403 Forbidden` for non-admin users
pub async fn layer(req: Request, next: Next) -> Result<Response, AppError> {
    let Some(authenticated) = req.extensions().get::<Authenticated>() else {
        return Err(AppError::unauthorized("Authentication required", json!({})));
    };

    if !authenticated.user.is_admin() {
        return Err(AppError::forbidden("Admin access required", json!({})));
    }

    Ok(next.run(req).await)
}
