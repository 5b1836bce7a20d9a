//! Shared application state injected into every handler.

use chrono::Duration;
use std::sync::Arc;

use crate::application::services::{AdminService, AuthService, LinkService, StatsService};
use crate::config::Config;
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::oauth::IdentityProvider;
use crate::infrastructure::storage::ObjectStorage;

/// Cookie and redirect settings used by the HTTP layer.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Adds the `Secure` attribute to the session and CSRF cookies.
    pub cookie_secure: bool,
    /// Max-age of the `sid` cookie, matching the server-side session TTL.
    pub session_ttl: Duration,
    /// Where the OAuth callback sends the browser afterwards.
    pub frontend_url: String,
    /// Trust `X-Forwarded-For` / `X-Real-IP` for client IPs.
    pub behind_proxy: bool,
    /// Prefix of short URLs in responses (`{public_base_url}/r/{slug}`).
    pub public_base_url: String,
}

impl HttpSettings {
    pub fn short_url(&self, slug: &str) -> String {
        format!("{}/r/{slug}", self.public_base_url)
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            cookie_secure: config.cookie_secure,
            session_ttl: Duration::hours(config.session_ttl_hours),
            frontend_url: config.frontend_url.clone(),
            behind_proxy: config.behind_proxy,
            public_base_url: config.public_base_url.clone(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            cookie_secure: false,
            session_ttl: Duration::hours(168),
            frontend_url: "http://localhost:3000".to_string(),
            behind_proxy: false,
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Application services and infrastructure handles.
///
/// Cloned per request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub stats_service: Arc<StatsService>,
    pub admin_service: Arc<AdminService>,
    pub auth_service: Arc<AuthService>,
    /// `None` when Google sign-in is not configured.
    pub identity_provider: Option<Arc<dyn IdentityProvider>>,
    pub cache: Arc<dyn CacheService>,
    pub storage: Arc<dyn ObjectStorage>,
    pub http: HttpSettings,
}
