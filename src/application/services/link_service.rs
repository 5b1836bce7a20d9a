//! Link creation, redirect resolution and owner management.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::application::pagination::PageRequest;
use crate::domain::click_event::{ClickEvent, ClientInfo};
use crate::domain::entities::{Link, LinkCounts, LinkPatch, NewLink};
use crate::domain::repositories::{LinkRepository, OwnerLinksQuery, UserRepository};
use crate::error::AppError;
use crate::infrastructure::cache::{CacheService, CachedLink};
use crate::infrastructure::storage::ObjectStorage;
use crate::utils::data_url::{decode_image, is_image_data_url};
use crate::utils::slug;
use crate::utils::url_normalizer::normalize_url;

/// Insert attempts for a generated slug before giving up.
const MAX_SLUG_ATTEMPTS: usize = 5;

/// Expiry, caching and target rules for links.
#[derive(Debug, Clone)]
pub struct LinkPolicy {
    pub anonymous_ttl: Duration,
    pub owned_ttl: Duration,
    pub cache_ttl_seconds: u64,
    /// Host short links are served from; targets on it are rejected.
    pub service_host: Option<String>,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            anonymous_ttl: Duration::days(7),
            owned_ttl: Duration::days(30),
            cache_ttl_seconds: 3600,
            service_host: None,
        }
    }
}

/// Requested changes to an owned link.
#[derive(Debug, Clone, Default)]
pub struct LinkUpdate {
    pub target_url: Option<String>,
    pub disabled: Option<bool>,
    /// `Some(None)` clears the options.
    pub qr_options: Option<Option<Value>>,
    pub renew: bool,
}

/// One page of an owner's links.
#[derive(Debug, Clone)]
pub struct OwnerLinks {
    pub items: Vec<Link>,
    /// Links matching the search filter, for pagination.
    pub total_matching: i64,
    /// Totals over all the owner's links, ignoring the filter.
    pub counts: LinkCounts,
}

/// Click queue occupancy, reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickQueueStatus {
    pub capacity: usize,
    pub available: usize,
    pub closed: bool,
}

/// Resolves a fetched link for an owner-scoped operation.
///
/// # Errors
///
/// [`AppError::NotFound`] when the link does not exist,
/// [`AppError::Forbidden`] when it belongs to someone else or nobody.
pub(crate) fn ensure_owned(
    link: Option<Link>,
    link_id: i64,
    owner_id: i64,
) -> Result<Link, AppError> {
    let link =
        link.ok_or_else(|| AppError::not_found("Link not found", json!({ "id": link_id })))?;

    if !link.is_owned_by(owner_id) {
        return Err(AppError::forbidden(
            "You do not own this link",
            json!({ "id": link_id }),
        ));
    }

    Ok(link)
}

pub struct LinkService {
    links: Arc<dyn LinkRepository>,
    users: Arc<dyn UserRepository>,
    cache: Arc<dyn CacheService>,
    storage: Arc<dyn ObjectStorage>,
    clicks: mpsc::Sender<ClickEvent>,
    policy: LinkPolicy,
}

impl LinkService {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        users: Arc<dyn UserRepository>,
        cache: Arc<dyn CacheService>,
        storage: Arc<dyn ObjectStorage>,
        clicks: mpsc::Sender<ClickEvent>,
        policy: LinkPolicy,
    ) -> Self {
        Self {
            links,
            users,
            cache,
            storage,
            clicks,
            policy,
        }
    }

    /// Creates a link, anonymous when `owner_id` is `None`.
    ///
    /// # Quota
    ///
    /// Owned creates fail with [`AppError::QuotaExceeded`] once the owner has
    /// `link_limit` links. Every link counts, including disabled and expired
    /// ones, until it is deleted.
    ///
    /// # Slugs
    ///
    /// - Custom slugs are validated and must be free ([`AppError::Conflict`])
    /// - Generated slugs are 5 characters for anonymous links, 7 for owned
    ///   ones; a collision on insert is retried with a fresh slug up to 5 times
    ///
    /// # Errors
    ///
    /// [`AppError::Validation`] for an invalid URL or custom slug,
    /// [`AppError::NotFound`] for an unknown owner, [`AppError::Internal`]
    /// after exhausting slug attempts.
    pub async fn create_link(
        &self,
        target_url: &str,
        owner_id: Option<i64>,
        custom_slug: Option<String>,
    ) -> Result<Link, AppError> {
        let target_url = self.normalize_target(target_url)?;

        if let Some(owner_id) = owner_id {
            self.check_quota(owner_id).await?;
        }

        let ttl = if owner_id.is_some() {
            self.policy.owned_ttl
        } else {
            self.policy.anonymous_ttl
        };
        let expired_at = Utc::now() + ttl;

        let link = match custom_slug {
            Some(custom) => {
                slug::validate_custom_slug(&custom)?;

                if self.links.find_by_slug(&custom).await?.is_some() {
                    return Err(slug_taken(&custom));
                }

                let new_link = NewLink {
                    slug: custom.clone(),
                    target_url,
                    owner_id,
                    expired_at,
                };

                match self.links.create(new_link).await {
                    Err(AppError::Conflict { .. }) => return Err(slug_taken(&custom)),
                    other => other?,
                }
            }
            None => {
                self.insert_with_generated_slug(target_url, owner_id, expired_at)
                    .await?
            }
        };

        metrics::counter!("links_created_total").increment(1);
        info!(
            link_id = link.id,
            slug = %link.slug,
            owner_id = ?link.owner_id,
            "Link created"
        );

        Ok(link)
    }

    async fn check_quota(&self, owner_id: i64) -> Result<(), AppError> {
        let owner = self
            .users
            .find_by_id(owner_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "id": owner_id })))?;

        let count = self.links.count_by_owner(owner_id).await?;
        if count >= i64::from(owner.link_limit) {
            return Err(AppError::quota_exceeded(
                "Link limit reached",
                json!({ "limit": owner.link_limit, "count": count }),
            ));
        }

        Ok(())
    }

    async fn insert_with_generated_slug(
        &self,
        target_url: String,
        owner_id: Option<i64>,
        expired_at: chrono::DateTime<Utc>,
    ) -> Result<Link, AppError> {
        let length = slug::length_for(owner_id.is_some());

        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let new_link = NewLink {
                slug: slug::generate(length),
                target_url: target_url.clone(),
                owner_id,
                expired_at,
            };

            match self.links.create(new_link).await {
                Ok(link) => return Ok(link),
                Err(AppError::Conflict { .. }) => {
                    debug!(attempt, "Slug collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::internal(
            "Failed to generate unique slug",
            json!({ "attempts": MAX_SLUG_ATTEMPTS }),
        ))
    }

    /// Resolves a slug for redirect and queues a click.
    ///
    /// Returns `None` when the slug is unknown, disabled or expired. The
    /// click is handed to the background worker with `try_send`; a full or
    /// closed queue drops it with a warning, never failing the redirect.
    pub async fn get_and_record_click(
        &self,
        slug: &str,
        client: ClientInfo,
    ) -> Result<Option<String>, AppError> {
        let now = Utc::now();

        let entry = match self.cache.get_link(slug).await {
            Ok(Some(entry)) => entry,
            Ok(None) => match self.load_and_cache(slug).await? {
                Some(entry) => entry,
                None => return Ok(None),
            },
            Err(e) => {
                warn!(slug, error = %e, "Cache lookup failed");
                match self.load_and_cache(slug).await? {
                    Some(entry) => entry,
                    None => return Ok(None),
                }
            }
        };

        let Some(target_url) = entry.resolve(now).map(str::to_string) else {
            debug!(slug, "Link inactive");
            return Ok(None);
        };

        self.enqueue_click(ClickEvent::new(entry.link_id, client));
        Ok(Some(target_url))
    }

    async fn load_and_cache(&self, slug: &str) -> Result<Option<CachedLink>, AppError> {
        let Some(link) = self.links.find_by_slug(slug).await? else {
            return Ok(None);
        };

        let entry = CachedLink::from(&link);
        if link.is_active() {
            let ttl = entry.ttl_seconds(self.policy.cache_ttl_seconds, Utc::now());
            if let Err(e) = self.cache.set_link(slug, &entry, ttl).await {
                warn!(slug, error = %e, "Cache write failed");
            }
        }

        Ok(Some(entry))
    }

    fn enqueue_click(&self, event: ClickEvent) {
        match self.clicks.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                metrics::counter!("clicks_dropped_total").increment(1);
                warn!(link_id = event.link_id, "Click queue full, dropping click");
            }
            Err(TrySendError::Closed(event)) => {
                metrics::counter!("clicks_dropped_total").increment(1);
                warn!(link_id = event.link_id, "Click queue closed, dropping click");
            }
        }
    }

    /// Lists an owner's links, newest first.
    ///
    /// `search` matches target URL or slug, case-insensitively.
    pub async fn find_links_by_owner(
        &self,
        owner_id: i64,
        page: PageRequest,
        search: Option<String>,
    ) -> Result<OwnerLinks, AppError> {
        let search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let query = OwnerLinksQuery {
            owner_id,
            offset: page.offset(),
            limit: page.limit(),
            search: search.clone(),
        };

        let items = self.links.list_by_owner(query).await?;
        let total_matching = self.links.count_matching(owner_id, search).await?;
        let counts = self.links.counts_by_owner(owner_id, Utc::now()).await?;

        Ok(OwnerLinks {
            items,
            total_matching,
            counts,
        })
    }

    /// Applies an owner's changes to a link.
    ///
    /// An inline `qr_options.image` (`data:image/...;base64,`) is uploaded to
    /// object storage and replaced with its public URL. `renew` moves the
    /// expiry to now plus the owned-link TTL.
    pub async fn update_link(
        &self,
        link_id: i64,
        owner_id: i64,
        update: LinkUpdate,
    ) -> Result<Link, AppError> {
        let link = ensure_owned(self.links.find_by_id(link_id).await?, link_id, owner_id)?;

        let target_url = update
            .target_url
            .map(|url| self.normalize_target(&url))
            .transpose()?;

        let (qr_options, stored_key) = match update.qr_options {
            Some(Some(options)) => {
                let (options, key) = self.store_qr_image(&link, options).await?;
                (Some(Some(options)), key)
            }
            other => (other, None),
        };

        let patch = LinkPatch {
            target_url,
            disabled: update.disabled,
            qr_options,
            expired_at: update.renew.then(|| Utc::now() + self.policy.owned_ttl),
        };

        if patch.is_empty() {
            return Ok(link);
        }

        let updated = self
            .links
            .update(link_id, patch)
            .await
            .and_then(|updated| {
                updated.ok_or_else(|| AppError::not_found("Link not found", json!({ "id": link_id })))
            })
            .inspect_err(|e| {
                if let Some(key) = &stored_key {
                    warn!(link_id, key = %key, error = %e, "Link update failed after storing QR image");
                }
            })?;

        self.invalidate(&updated.slug).await;
        info!(link_id, "Link updated");

        Ok(updated)
    }

    /// Uploads an inline `image` and swaps in its public URL. Returns the
    /// storage key when something was uploaded.
    ///
    /// Keys are `qr-{id}-{slug prefix}.{ext}`, so a new logo for the same link
    /// and format replaces the previous object.
    async fn store_qr_image(
        &self,
        link: &Link,
        mut options: Value,
    ) -> Result<(Value, Option<String>), AppError> {
        let Some(fields) = options.as_object_mut() else {
            return Err(AppError::bad_request(
                "QR options must be an object",
                json!({}),
            ));
        };

        let Some(Value::String(image)) = fields.get("image") else {
            return Ok((options, None));
        };
        if !is_image_data_url(image) {
            return Ok((options, None));
        }

        let decoded = decode_image(image).map_err(|e| {
            AppError::bad_request("Invalid QR image", json!({ "reason": e.to_string() }))
        })?;

        let slug_prefix: String = link.slug.chars().take(10).collect();
        let key = format!("qr-{}-{slug_prefix}.{}", link.id, decoded.extension);
        let url = self
            .storage
            .put(&key, &decoded.content_type, decoded.bytes)
            .await
            .map_err(|e| {
                AppError::internal("Failed to store QR image", json!({ "reason": e.to_string() }))
            })?;

        fields.insert("image".to_string(), Value::String(url));
        Ok((options, Some(key)))
    }

    /// Deletes an owner's link.
    pub async fn delete_link(&self, link_id: i64, owner_id: i64) -> Result<(), AppError> {
        let link = ensure_owned(self.links.find_by_id(link_id).await?, link_id, owner_id)?;

        if !self.links.delete(link_id).await? {
            return Err(AppError::not_found("Link not found", json!({ "id": link_id })));
        }

        self.invalidate(&link.slug).await;
        info!(link_id, slug = %link.slug, "Link deleted");

        Ok(())
    }

    /// Deletes anonymous links whose expiry has passed. Returns the count.
    pub async fn delete_expired_anonymous_links(&self) -> Result<u64, AppError> {
        let deleted = self.links.delete_expired_anonymous(Utc::now()).await?;
        metrics::counter!("links_cleaned_total").increment(deleted);
        Ok(deleted)
    }

    pub fn click_queue_status(&self) -> ClickQueueStatus {
        ClickQueueStatus {
            capacity: self.clicks.max_capacity(),
            available: self.clicks.capacity(),
            closed: self.clicks.is_closed(),
        }
    }

    fn normalize_target(&self, target_url: &str) -> Result<String, AppError> {
        normalize_url(target_url, self.policy.service_host.as_deref()).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })
    }

    async fn invalidate(&self, slug: &str) {
        if let Err(e) = self.cache.invalidate(slug).await {
            warn!(slug, error = %e, "Cache invalidation failed");
        }
    }
}

fn slug_taken(slug: &str) -> AppError {
    AppError::conflict("Slug is already taken", json!({ "slug": slug }))
}
