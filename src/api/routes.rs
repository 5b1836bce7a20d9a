//! API route configuration.
//!
//! Every `/api` route passes through [`session::layer`] (resolves the `sid`
//! cookie) and [`csrf::layer`] (unsafe methods need `X-CSRF-Token`).
//! Admin routes additionally require the `ADMIN` role.

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

use crate::api::handlers::{
    change_password_handler, change_role_handler, create_link_handler, csrf_handler,
    delete_link_handler, delete_user_handler, google_callback_handler, google_login_handler,
    link_stats_handler, list_links_handler, list_users_handler, login_handler, logout_handler,
    me_handler, register_handler, update_limit_handler, update_link_handler,
    update_status_handler,
};
use crate::api::middleware::{admin, csrf, rate_limit, session};
use crate::state::AppState;

/// Whether per-IP rate limits are applied.
///
/// Limiting reads the peer address from `ConnectInfo`, so it is only
/// available when the server is started with connect info.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimiting {
    Disabled,
    PerIp { behind_proxy: bool },
}

/// Endpoints that check a password.
///
/// - `POST /auth/register`
/// - `POST /auth/login`
/// - `POST /auth/change-password`
fn credential_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/change-password", post(change_password_handler))
}

/// Session, sign-in and link endpoints.
///
/// - `GET    /auth/csrf`
/// - `POST   /auth/logout`
/// - `GET    /auth/me`
/// - `GET    /auth/google`
/// - `GET    /auth/google/callback`
/// - `POST   /links`            (anonymous or signed in)
/// - `GET    /links`
/// - `PATCH  /links/{id}`
/// - `DELETE /links/{id}`
/// - `GET    /links/{id}/stats`
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/csrf", get(csrf_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/me", get(me_handler))
        .route("/auth/google", get(google_login_handler))
        .route("/auth/google/callback", get(google_callback_handler))
        .route("/links", post(create_link_handler).get(list_links_handler))
        .route(
            "/links/{id}",
            patch(update_link_handler).delete(delete_link_handler),
        )
        .route("/links/{id}/stats", get(link_stats_handler))
}

/// Admin console, `ADMIN` role only.
///
/// - `GET    /admin/users`
/// - `PATCH  /admin/users/{id}/status`
/// - `PATCH  /admin/users/{id}/role`
/// - `PATCH  /admin/users/{id}/limit`
/// - `DELETE /admin/users/{id}`
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users_handler))
        .route("/admin/users/{id}", delete(delete_user_handler))
        .route("/admin/users/{id}/status", patch(update_status_handler))
        .route("/admin/users/{id}/role", patch(change_role_handler))
        .route("/admin/users/{id}/limit", patch(update_limit_handler))
        .route_layer(middleware::from_fn(admin::layer))
}

/// All API routes, to be nested under `/api`.
pub fn router(state: AppState, rate_limiting: RateLimiting) -> Router<AppState> {
    let (credentials, rest) = match rate_limiting {
        RateLimiting::Disabled => (
            credential_routes(),
            user_routes().merge(admin_routes()),
        ),
        RateLimiting::PerIp { behind_proxy } => (
            rate_limit::apply(credential_routes(), rate_limit::AUTH, behind_proxy),
            rate_limit::apply(
                user_routes().merge(admin_routes()),
                rate_limit::PUBLIC,
                behind_proxy,
            ),
        ),
    };

    Router::new()
        .merge(credentials)
        .merge(rest)
        .layer(middleware::from_fn_with_state(state.clone(), csrf::layer))
        .layer(middleware::from_fn_with_state(state, session::layer))
}
