//! DTOs for link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::serde_as;
use validator::Validate;

use super::pagination::PaginationMeta;
use crate::application::services::LinkUpdate;
use crate::domain::entities::{Link, LinkCounts};

/// Body of `POST /api/links`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// Destination, normalized by the link service.
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub target_url: String,

    /// Optional custom slug, checked against the slug rules by the service.
    pub custom_slug: Option<String>,
}

/// Body of `PATCH /api/links/{id}`.
///
/// All fields are optional; only provided fields are changed.
///
/// # `qr_options` semantics
///
/// - **Absent** → leave existing value unchanged
/// - **`null`** → clear the options
/// - **Object** → replace; an `image` given as a `data:image/...;base64,` URL
///   is uploaded and swapped for its public URL
#[serde_as]
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub target_url: Option<String>,

    pub disabled: Option<bool>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub qr_options: Option<Option<Value>>,

    /// Extends the expiry to now plus the owned-link lifetime.
    #[serde(default)]
    pub renew: bool,
}

impl From<UpdateLinkRequest> for LinkUpdate {
    fn from(request: UpdateLinkRequest) -> Self {
        LinkUpdate {
            target_url: request.target_url,
            disabled: request.disabled,
            qr_options: request.qr_options,
            renew: request.renew,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub slug: String,
    pub short_url: String,
    pub target_url: String,
    pub expired_at: DateTime<Utc>,
    pub disabled: bool,
    pub is_active: bool,
    pub qr_options: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkResponse {
    pub fn new(link: Link, short_url: String) -> Self {
        let is_active = link.is_active();
        Self {
            id: link.id,
            slug: link.slug,
            short_url,
            target_url: link.target_url,
            expired_at: link.expired_at,
            disabled: link.disabled,
            is_active,
            qr_options: link.qr_options,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LinkCountsResponse {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
}

impl From<LinkCounts> for LinkCountsResponse {
    fn from(counts: LinkCounts) -> Self {
        Self {
            total: counts.total,
            active: counts.active,
            inactive: counts.inactive,
        }
    }
}

/// Response of `GET /api/links`.
///
/// `counts` covers all the caller's links regardless of `search`;
/// `pagination.total_items` counts the filtered set.
#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub items: Vec<LinkResponse>,
    pub pagination: PaginationMeta,
    pub counts: LinkCountsResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_qr_options_absent_null_and_value() {
        let absent: UpdateLinkRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(absent.qr_options, None);
        assert!(!absent.renew);

        let cleared: UpdateLinkRequest =
            serde_json::from_value(json!({ "qr_options": null })).unwrap();
        assert_eq!(cleared.qr_options, Some(None));

        let set: UpdateLinkRequest =
            serde_json::from_value(json!({ "qr_options": { "color": "#000" } })).unwrap();
        assert_eq!(set.qr_options, Some(Some(json!({ "color": "#000" }))));
    }

    #[test]
    fn test_create_request_requires_url() {
        let request = CreateLinkRequest {
            target_url: String::new(),
            custom_slug: None,
        };
        assert!(request.validate().is_err());
    }
}
