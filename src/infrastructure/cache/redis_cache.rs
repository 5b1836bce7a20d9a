//! Redis-backed redirect cache.

use super::service::{CacheError, CacheResult, CacheService, CachedLink};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info, warn};

const KEY_PREFIX: &str = "slug:";

/// Redis cache holding JSON-encoded [`CachedLink`] entries.
///
/// Uses a `ConnectionManager` for reconnects. Operations fail open: errors are
/// logged and reported as misses or no-ops.
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connects and verifies the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the
    /// connection cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {e}"))
        })?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Failed to connect to Redis: {e}")))?;

        let mut conn = manager.clone();
        conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {e}")))?;

        info!("✓ Connected to Redis");

        Ok(Self { conn: manager })
    }

    fn key(slug: &str) -> String {
        format!("{KEY_PREFIX}{slug}")
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_link(&self, slug: &str) -> CacheResult<Option<CachedLink>> {
        let mut conn = self.conn.clone();

        let raw = match conn.get::<_, Option<String>>(Self::key(slug)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(slug, error = %e, "Redis GET failed");
                return Ok(None);
            }
        };

        let Some(raw) = raw else {
            debug!(slug, "Cache MISS");
            return Ok(None);
        };

        match serde_json::from_str::<CachedLink>(&raw) {
            Ok(entry) => {
                debug!(slug, "Cache HIT");
                Ok(Some(entry))
            }
            Err(e) => {
                warn!(slug, error = %e, "Discarding undecodable cache entry");
                let _ = conn.del::<_, i32>(Self::key(slug)).await;
                Ok(None)
            }
        }
    }

    async fn set_link(
        &self,
        slug: &str,
        entry: &CachedLink,
        ttl_seconds: u64,
    ) -> CacheResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let payload = serde_json::to_string(entry)
            .map_err(|e| CacheError::OperationError(e.to_string()))?;
        let mut conn = self.conn.clone();

        if let Err(e) = conn
            .set_ex::<_, _, ()>(Self::key(slug), payload, ttl_seconds)
            .await
        {
            warn!(slug, error = %e, "Redis SET failed");
        } else {
            debug!(slug, ttl_seconds, "Cache SET");
        }
        Ok(())
    }

    async fn invalidate(&self, slug: &str) -> CacheResult<()> {
        let mut conn = self.conn.clone();

        match conn.del::<_, i32>(Self::key(slug)).await {
            Ok(deleted) if deleted > 0 => debug!(slug, "Cache INVALIDATE"),
            Ok(_) => {}
            Err(e) => warn!(slug, error = %e, "Redis DEL failed"),
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        conn.ping::<()>().await.is_ok()
    }
}
