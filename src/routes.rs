//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /r/{slug}`    - Short link redirect (public)
//! - `GET  /health`      - Health check: DB, click queue, cache, storage (public)
//! - `/api/*`            - REST API (session cookie, CSRF header on writes)
//! - `/uploads/*`        - QR logos stored by the local storage driver, served
//!   sandboxed so an uploaded SVG cannot run script on this origin
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **CORS** - Credentialed requests from the SPA origin
//! - **Rate limiting** - Per-IP token bucket (configurable for proxy deployments)
//! - **Path normalization** - Trailing slash handling

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::routing::get;
use tower::{Layer, ServiceBuilder};
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::{SetResponseHeader, SetResponseHeaderLayer};

use crate::api;
use crate::api::cookies::CSRF_HEADER;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{rate_limit, tracing};
use crate::api::routes::RateLimiting;
use crate::state::AppState;

/// Router-level settings taken from the configuration.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub rate_limiting: RateLimiting,
    /// Origin allowed to make credentialed cross-origin requests.
    pub cors_origin: String,
    /// Directory served at `/uploads`, when the local storage driver is used.
    pub upload_dir: Option<String>,
}

/// `Content-Security-Policy` of uploaded files.
pub const UPLOADS_CSP: &str = "default-src 'none'; style-src 'unsafe-inline'; sandbox";

type UploadsService = SetResponseHeader<SetResponseHeader<ServeDir, HeaderValue>, HeaderValue>;

fn uploads_service(upload_dir: String) -> UploadsService {
    ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(UPLOADS_CSP),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .service(ServeDir::new(upload_dir))
}

fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(origin)
        .with_context(|| format!("CORS_ORIGIN '{origin}' is not a valid header value"))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(CSRF_HEADER)]))
}

/// Constructs the application router with all routes and middleware.
///
/// # Errors
///
/// Returns an error if the CORS origin is not a valid header value.
pub fn app_router(state: AppState, options: RouterOptions) -> Result<NormalizePath<Router>> {
    let api_router = api::routes::router(state.clone(), options.rate_limiting);

    let public = Router::new()
        .route("/r/{slug}", get(redirect_handler))
        .route("/health", get(health_handler));
    let public = match options.rate_limiting {
        RateLimiting::Disabled => public,
        RateLimiting::PerIp { behind_proxy } => {
            rate_limit::apply(public, rate_limit::PUBLIC, behind_proxy)
        }
    };

    let mut router = Router::new().merge(public).nest("/api", api_router);

    if let Some(upload_dir) = options.upload_dir {
        router = router.nest_service("/uploads", uploads_service(upload_dir));
    }

    let router = router
        .with_state(state)
        .layer(cors_layer(&options.cors_origin)?)
        .layer(tracing::layer());

    Ok(NormalizePathLayer::trim_trailing_slash().layer(router))
}
