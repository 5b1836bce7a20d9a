//! Rate limiting middleware using token bucket algorithm.

use axum::Router;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::{GovernorConfig, GovernorConfigBuilder},
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

use crate::state::AppState;

/// Token bucket settings for one group of routes.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub per_second: u64,
    pub burst: u32,
}

/// General API and redirect traffic: 2 requests per second, burst 100.
pub const PUBLIC: RateLimit = RateLimit {
    per_second: 2,
    burst: 100,
};

/// Credential endpoints (login, register, password change): 1 request per
/// second, burst 10.
pub const AUTH: RateLimit = RateLimit {
    per_second: 1,
    burst: 10,
};

fn config<K: KeyExtractor>(
    extractor: K,
    limit: RateLimit,
) -> Arc<GovernorConfig<K, NoOpMiddleware<QuantaInstant>>> {
    Arc::new(
        GovernorConfigBuilder::default()
            .per_second(limit.per_second)
            .burst_size(limit.burst)
            .key_extractor(extractor)
            .finish()
            .expect("rate limit settings are non-zero"),
    )
}

/// Applies a per-IP limit to every route of `router`.
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// # Key Extraction
///
/// - `behind_proxy = false`: the socket peer address
/// - `behind_proxy = true`: `X-Forwarded-For` / `X-Real-IP` / `Forwarded`,
///   falling back to the peer address
///
/// Needs the server to run with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn apply(router: Router<AppState>, limit: RateLimit, behind_proxy: bool) -> Router<AppState> {
    if behind_proxy {
        router.layer(GovernorLayer::new(config(SmartIpKeyExtractor, limit)))
    } else {
        router.layer(GovernorLayer::new(config(PeerIpKeyExtractor, limit)))
    }
}
