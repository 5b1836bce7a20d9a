//! Handlers for account, session and sign-in endpoints.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
};
use axum_extra::extract::CookieJar;
use serde_json::json;
use tracing::{info, warn};
use validator::Validate;

use crate::api::cookies::{
    self, CSRF_COOKIE, OAUTH_STATE_COOKIE, SESSION_COOKIE, csrf_cookie, oauth_state_cookie,
    session_cookie,
};
use crate::api::dto::auth::{
    ChangePasswordRequest, CredentialsRequest, CsrfResponse, OAuthCallbackQuery, SessionResponse,
    UserResponse,
};
use crate::api::extractors::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

/// Issues a CSRF token.
///
/// # Endpoint
///
/// `GET /api/auth/csrf`
///
/// Sets the `csrf_token` cookie and returns the same value. The SPA echoes it
/// in `X-CSRF-Token` on every unsafe request.
pub async fn csrf_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<CsrfResponse>), AppError> {
    let token = state.auth_service.issue_csrf_token()?;
    let jar = jar.add(csrf_cookie(token.clone(), &state.http));

    Ok((jar, Json(CsrfResponse { csrf_token: token })))
}

/// Creates a local account.
///
/// # Endpoint
///
/// `POST /api/auth/register`
///
/// # Errors
///
/// - `400` invalid email or password outside 8-128 characters
/// - `409` email already registered
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload.validate()?;

    let user = state
        .auth_service
        .register(&payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Password login. Sets the `sid` session cookie.
///
/// # Endpoint
///
/// `POST /api/auth/login`
///
/// # Errors
///
/// `401` for wrong credentials or a blocked account.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    payload.validate()?;

    let grant = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    let jar = jar.add(session_cookie(grant.token, &state.http));

    Ok((
        jar,
        Json(SessionResponse {
            user: UserResponse::from(&grant.user),
            expires_at: grant.expires_at,
        }),
    ))
}

/// Ends the current session and clears the cookie.
///
/// # Endpoint
///
/// `POST /api/auth/logout`
pub async fn logout_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), AppError> {
    state.auth_service.logout(current.token()).await?;

    let jar = jar
        .remove(cookies::removal(SESSION_COOKIE))
        .remove(cookies::removal(CSRF_COOKIE));

    Ok((jar, StatusCode::NO_CONTENT))
}

/// Returns the signed-in user.
///
/// # Endpoint
///
/// `GET /api/auth/me`
pub async fn me_handler(current: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(current.user()))
}

/// Changes the password. Other sessions of the user are signed out; the
/// current one stays valid.
///
/// # Endpoint
///
/// `POST /api/auth/change-password`
///
/// # Errors
///
/// - `400` OAuth-only account or new password outside 8-128 characters
/// - `401` wrong current password
pub async fn change_password_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    state
        .auth_service
        .change_password(
            current.user(),
            current.token(),
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn google_disabled() -> AppError {
    AppError::not_found("Google sign-in is not configured", json!({}))
}

/// Starts Google sign-in.
///
/// # Endpoint
///
/// `GET /api/auth/google`
///
/// Stores a signed `state` in a short-lived cookie and redirects to the
/// consent page.
pub async fn google_login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let provider = state.identity_provider.as_ref().ok_or_else(google_disabled)?;

    let oauth_state = state.auth_service.issue_csrf_token()?;
    let location = provider.authorize_url(&oauth_state);
    let jar = jar.add(oauth_state_cookie(oauth_state, &state.http));

    Ok((jar, Redirect::to(&location)))
}

/// Completes Google sign-in.
///
/// # Endpoint
///
/// `GET /api/auth/google/callback`
///
/// On success sets the session cookie and redirects to the frontend. Any
/// failure (denied consent, state mismatch, blocked account, provider error)
/// redirects to `{FRONTEND_URL}/login?error=<reason>` instead of rendering an
/// API error, since the browser arrives here by top-level navigation.
pub async fn google_callback_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<(CookieJar, Redirect), AppError> {
    let provider = state.identity_provider.as_ref().ok_or_else(google_disabled)?;

    let frontend = state.http.frontend_url.trim_end_matches('/').to_string();
    let failure = |reason: &str| Redirect::to(&format!("{frontend}/login?error={reason}"));

    let expected_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(cookies::removal(OAUTH_STATE_COOKIE));

    if let Some(error) = query.error {
        info!(error, "Google sign-in was not granted");
        return Ok((jar, failure("access_denied")));
    }

    if state
        .auth_service
        .verify_csrf(expected_state.as_deref(), query.state.as_deref())
        .is_err()
    {
        warn!("Google callback with invalid state");
        return Ok((jar, failure("invalid_state")));
    }

    let Some(code) = query.code else {
        return Ok((jar, failure("missing_code")));
    };

    let identity = match provider.exchange_code(&code).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!(error = %e, "Google code exchange failed");
            return Ok((jar, failure("provider_error")));
        }
    };

    match state.auth_service.login_oauth(&identity).await {
        Ok(grant) => {
            let jar = jar.add(session_cookie(grant.token, &state.http));
            Ok((jar, Redirect::to(&format!("{frontend}/"))))
        }
        Err(AppError::Unauthorized { .. }) => Ok((jar, failure("account_blocked"))),
        Err(e) => Err(e),
    }
}
