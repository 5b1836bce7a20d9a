//! Click event model for asynchronous click tracking.

use crate::domain::entities::NewClick;

/// Request metadata captured on a redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

/// An in-memory click waiting to be persisted.
///
/// Sent from the redirect path to the background worker over a bounded
/// channel so the redirect never waits on the insert.
///
/// # Usage Flow
///
/// 1. Created by [`crate::application::services::LinkService::get_and_record_click`]
/// 2. Sent to the channel with `try_send` (dropped when the queue is full)
/// 3. Processed by [`crate::domain::click_worker::run_click_worker`]
/// 4. Converted to [`NewClick`] for persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub link_id: i64,
    pub client: ClientInfo,
}

impl ClickEvent {
    pub fn new(link_id: i64, client: ClientInfo) -> Self {
        Self { link_id, client }
    }
}

impl From<ClickEvent> for NewClick {
    fn from(event: ClickEvent) -> Self {
        let ClientInfo {
            ip,
            user_agent,
            referrer,
            country,
            city,
        } = event.client;

        NewClick {
            link_id: event.link_id,
            ip,
            user_agent,
            referrer,
            country,
            city,
        }
    }
}
