//! CSRF double-submit verification.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::api::cookies::{CSRF_COOKIE, CSRF_HEADER};
use crate::error::AppError;
use crate::state::AppState;

/// Requires `X-CSRF-Token` to match the signed `csrf_token` cookie on every
/// unsafe method. `GET`, `HEAD` and `OPTIONS` pass through.
///
/// Tokens come from `GET /api/auth/csrf`.
///
/// # Errors
///
/// Returns `403 Forbidden` when the header or cookie is missing, they differ,
/// or the signature does not verify.
pub async fn layer(
    State(st): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return Ok(next.run(req).await);
    }

    let header = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok());
    let cookie = jar.get(CSRF_COOKIE).map(|c| c.value());

    st.auth_service.verify_csrf(cookie, header)?;

    Ok(next.run(req).await)
}
