//! Request extractors for the signed-in user and click metadata.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{HeaderMap, header, request::Parts};
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::application::services::Authenticated;
use crate::domain::click_event::ClientInfo;
use crate::domain::entities::User;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// The authenticated caller. Rejects with 401 when the session layer found
/// no valid `sid` cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Authenticated);

impl CurrentUser {
    pub fn user(&self) -> &User {
        &self.0.user
    }

    pub fn id(&self) -> i64 {
        self.0.user.id
    }

    pub fn token(&self) -> &str {
        &self.0.token
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Authenticated>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::unauthorized("Authentication required", json!({})))
    }
}

/// The caller if signed in, for endpoints that also serve anonymous users.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Authenticated>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<Authenticated>().cloned()))
    }
}

/// Click metadata: client IP (proxy-aware), user agent, referrer and the
/// Cloudflare geo headers.
#[derive(Debug, Clone)]
pub struct ClientMeta(pub ClientInfo);

fn header_string(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl FromRequestParts<AppState> for ClientMeta {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let headers = &parts.headers;

        Ok(ClientMeta(ClientInfo {
            ip: client_ip(headers, peer, state.http.behind_proxy).map(|ip| ip.to_string()),
            user_agent: header_string(headers, header::USER_AGENT),
            referrer: header_string(headers, header::REFERER),
            country: header_string(headers, "cf-ipcountry"),
            city: header_string(headers, "cf-ipcity"),
        }))
    }
}
