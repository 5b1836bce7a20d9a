//! Session cookie authentication.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use crate::api::cookies::SESSION_COOKIE;
use crate::state::AppState;

/// Resolves the `sid` cookie into an [`Authenticated`] request extension.
///
/// Never rejects: a missing, expired or revoked session just leaves the
/// request anonymous. Handlers that need a user take
/// [`CurrentUser`](crate::api::extractors::CurrentUser), which turns the
/// missing extension into a 401.
///
/// # Example
///
/// ```rust,ignore
/// let api = Router::new()
///     .route("/links", get(list_links_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), session::layer));
/// ```
///
/// [`Authenticated`]: crate::application::services::Authenticated
pub async fn layer(
    State(st): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        match st.auth_service.authenticate(cookie.value()).await {
            Ok(authenticated) => {
                req.extensions_mut().insert(authenticated);
            }
            Err(e) => debug!(error = %e, "Ignoring session cookie"),
        }
    }

    next.run(req).await
}
