//! In-memory repositories backing the HTTP tests.
//!
//! One store implements every repository trait so that deletes cascade the
//! way the database foreign keys do.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use shortlink::AppError;
use shortlink::domain::entities::{
    Click, DailyClicks, Link, LinkCounts, LinkPatch, NewClick, NewLink, NewSession, NewUser,
    Role, Session, User, UserSummary, ValueCount,
};
use shortlink::domain::repositories::{
    LinkRepository, OwnerLinksQuery, SessionRepository, StatsRepository, UserListQuery,
    UserRepository,
};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    links: Vec<Link>,
    clicks: Vec<Click>,
    sessions: Vec<Session>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn delete_user(&mut self, id: i64) {
        let link_ids: Vec<i64> = self
            .links
            .iter()
            .filter(|l| l.owner_id == Some(id))
            .map(|l| l.id)
            .collect();

        self.clicks.retain(|c| !link_ids.contains(&c.link_id));
        self.links.retain(|l| l.owner_id != Some(id));
        self.sessions.retain(|s| s.user_id != id);
        self.users.retain(|u| u.id != id);
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn link_by_slug(&self, slug: &str) -> Option<Link> {
        self.lock().links.iter().find(|l| l.slug == slug).cloned()
    }

    pub fn user_by_id(&self, id: i64) -> Option<User> {
        self.lock().users.iter().find(|u| u.id == id).cloned()
    }

    pub fn clicks_for(&self, link_id: i64) -> Vec<Click> {
        self.lock()
            .clicks
            .iter()
            .filter(|c| c.link_id == link_id)
            .cloned()
            .collect()
    }

    pub fn session_count(&self, user_id: i64) -> usize {
        self.lock()
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .count()
    }

    /// Moves a link's expiry, bypassing the service rules.
    pub fn set_expiry(&self, link_id: i64, expired_at: DateTime<Utc>) {
        if let Some(link) = self.lock().links.iter_mut().find(|l| l.id == link_id) {
            link.expired_at = expired_at;
        }
    }

    /// Inserts a click at a given time.
    pub fn insert_click(&self, link_id: i64, referrer: Option<&str>, at: DateTime<Utc>) {
        let mut tables = self.lock();
        let id = tables.next_id();
        tables.clicks.push(Click {
            id,
            link_id,
            ip: None,
            user_agent: Some("test-agent".to_string()),
            referrer: referrer.map(str::to_string),
            country: None,
            city: None,
            created_at: at,
        });
    }
}

fn matches_search(haystack: &[&str], search: &Option<String>) -> bool {
    match search {
        Some(term) => {
            let term = term.to_lowercase();
            haystack.iter().any(|h| h.to_lowercase().contains(&term))
        }
        None => true,
    }
}

fn page<T>(items: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

fn top_values(values: impl Iterator<Item = String>, limit: i64) -> Vec<ValueCount> {
    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    let mut rows: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount { value, count })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    rows.truncate(limit.max(0) as usize);
    rows
}

#[async_trait]
impl LinkRepository for MemoryStore {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut tables = self.lock();
        if tables.links.iter().any(|l| l.slug == new_link.slug) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "links_slug_key" }),
            ));
        }

        let now = Utc::now();
        let link = Link {
            id: tables.next_id(),
            slug: new_link.slug,
            target_url: new_link.target_url,
            owner_id: new_link.owner_id,
            expired_at: new_link.expired_at,
            disabled: false,
            qr_options: None,
            created_at: now,
            updated_at: now,
        };
        tables.links.push(link.clone());
        Ok(link)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        Ok(self.lock().links.iter().find(|l| l.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError> {
        Ok(self.link_by_slug(slug))
    }

    async fn count_by_owner(&self, owner_id: i64) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .links
            .iter()
            .filter(|l| l.owner_id == Some(owner_id))
            .count() as i64)
    }

    async fn list_by_owner(&self, query: OwnerLinksQuery) -> Result<Vec<Link>, AppError> {
        let mut links: Vec<Link> = self
            .lock()
            .links
            .iter()
            .filter(|l| l.owner_id == Some(query.owner_id))
            .filter(|l| matches_search(&[&l.target_url, &l.slug], &query.search))
            .cloned()
            .collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(page(links, query.offset, query.limit))
    }

    async fn count_matching(
        &self,
        owner_id: i64,
        search: Option<String>,
    ) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .links
            .iter()
            .filter(|l| l.owner_id == Some(owner_id))
            .filter(|l| matches_search(&[&l.target_url, &l.slug], &search))
            .count() as i64)
    }

    async fn counts_by_owner(
        &self,
        owner_id: i64,
        now: DateTime<Utc>,
    ) -> Result<LinkCounts, AppError> {
        let tables = self.lock();
        let owned: Vec<&Link> = tables
            .links
            .iter()
            .filter(|l| l.owner_id == Some(owner_id))
            .collect();
        let total = owned.len() as i64;
        let active = owned
            .iter()
            .filter(|l| !l.disabled && !l.is_expired_at(now))
            .count() as i64;

        Ok(LinkCounts {
            total,
            active,
            inactive: total - active,
        })
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<Option<Link>, AppError> {
        let mut tables = self.lock();
        let Some(link) = tables.links.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };

        if let Some(target_url) = patch.target_url {
            link.target_url = target_url;
        }
        if let Some(disabled) = patch.disabled {
            link.disabled = disabled;
        }
        if let Some(qr_options) = patch.qr_options {
            link.qr_options = qr_options;
        }
        if let Some(expired_at) = patch.expired_at {
            link.expired_at = expired_at;
        }
        link.updated_at = Utc::now();

        Ok(Some(link.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.lock();
        let before = tables.links.len();
        tables.links.retain(|l| l.id != id);
        tables.clicks.retain(|c| c.link_id != id);
        Ok(tables.links.len() < before)
    }

    async fn delete_expired_anonymous(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tables = self.lock();
        let expired: Vec<i64> = tables
            .links
            .iter()
            .filter(|l| l.is_anonymous() && l.is_expired_at(now))
            .map(|l| l.id)
            .collect();

        tables.links.retain(|l| !expired.contains(&l.id));
        tables.clicks.retain(|c| !expired.contains(&c.link_id));
        Ok(expired.len() as u64)
    }

    async fn slugs_by_owner(&self, owner_id: i64) -> Result<Vec<String>, AppError> {
        Ok(self
            .lock()
            .links
            .iter()
            .filter(|l| l.owner_id == Some(owner_id))
            .map(|l| l.slug.clone())
            .collect())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut tables = self.lock();
        if tables.users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "users_email_key" }),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: tables.next_id(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            provider: new_user.provider,
            role: new_user.role,
            is_blocked: false,
            link_limit: new_user.link_limit,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.user_by_id(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn list(&self, query: UserListQuery) -> Result<Vec<UserSummary>, AppError> {
        let tables = self.lock();
        let mut users: Vec<&User> = tables
            .users
            .iter()
            .filter(|u| u.id != query.exclude_id)
            .filter(|u| matches_search(&[&u.email], &query.search))
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let rows = users
            .into_iter()
            .map(|user| UserSummary {
                user: user.clone(),
                link_count: tables
                    .links
                    .iter()
                    .filter(|l| l.owner_id == Some(user.id))
                    .count() as i64,
            })
            .collect();

        Ok(page(rows, query.offset, query.limit))
    }

    async fn count_matching(
        &self,
        exclude_id: i64,
        search: Option<String>,
    ) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| u.id != exclude_id)
            .filter(|u| matches_search(&[&u.email], &search))
            .count() as i64)
    }

    async fn count_all(&self) -> Result<i64, AppError> {
        Ok(self.lock().users.len() as i64)
    }

    async fn set_blocked_unless_admin(
        &self,
        id: i64,
        blocked: bool,
    ) -> Result<Option<User>, AppError> {
        let mut tables = self.lock();
        let Some(user) = tables
            .users
            .iter_mut()
            .find(|u| u.id == id && u.role != Role::Admin)
        else {
            return Ok(None);
        };

        user.is_blocked = blocked;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_role(&self, id: i64, role: Role) -> Result<Option<User>, AppError> {
        let mut tables = self.lock();
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.role = role;
            user.clone()
        }))
    }

    async fn set_link_limit(&self, id: i64, link_limit: i32) -> Result<Option<User>, AppError> {
        let mut tables = self.lock();
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.link_limit = link_limit;
            user.clone()
        }))
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, AppError> {
        let mut tables = self.lock();
        Ok(match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = Some(password_hash.to_string());
                true
            }
            None => false,
        })
    }

    async fn delete_unless_admin(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.lock();
        if !tables
            .users
            .iter()
            .any(|u| u.id == id && u.role != Role::Admin)
        {
            return Ok(false);
        }

        tables.delete_user(id);
        Ok(true)
    }
}

#[async_trait]
impl StatsRepository for MemoryStore {
    async fn record_click(&self, new_click: NewClick) -> Result<Click, AppError> {
        let mut tables = self.lock();
        if !tables.links.iter().any(|l| l.id == new_click.link_id) {
            return Err(AppError::internal(
                "Database error",
                json!({ "reason": "foreign key violation" }),
            ));
        }

        let click = Click {
            id: tables.next_id(),
            link_id: new_click.link_id,
            ip: new_click.ip,
            user_agent: new_click.user_agent,
            referrer: new_click.referrer,
            country: new_click.country,
            city: new_click.city,
            created_at: Utc::now(),
        };
        tables.clicks.push(click.clone());
        Ok(click)
    }

    async fn count_clicks(&self, link_id: i64) -> Result<i64, AppError> {
        Ok(self.clicks_for(link_id).len() as i64)
    }

    async fn daily_clicks(
        &self,
        link_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyClicks>, AppError> {
        let mut days: BTreeMap<chrono::NaiveDate, i64> = BTreeMap::new();
        for click in self.clicks_for(link_id) {
            if click.created_at >= since {
                *days.entry(click.created_at.date_naive()).or_default() += 1;
            }
        }

        Ok(days
            .into_iter()
            .map(|(day, clicks)| DailyClicks { day, clicks })
            .collect())
    }

    async fn top_referrers(&self, link_id: i64, limit: i64) -> Result<Vec<ValueCount>, AppError> {
        let clicks = self.clicks_for(link_id);
        Ok(top_values(
            clicks
                .into_iter()
                .map(|c| c.referrer.unwrap_or_else(|| "direct".to_string())),
            limit,
        ))
    }

    async fn top_user_agents(
        &self,
        link_id: i64,
        limit: i64,
    ) -> Result<Vec<ValueCount>, AppError> {
        let clicks = self.clicks_for(link_id);
        Ok(top_values(
            clicks
                .into_iter()
                .map(|c| c.user_agent.unwrap_or_else(|| "unknown".to_string())),
            limit,
        ))
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create(&self, new_session: NewSession) -> Result<Session, AppError> {
        let mut tables = self.lock();
        let session = Session {
            id: tables.next_id(),
            token_hash: new_session.token_hash,
            user_id: new_session.user_id,
            expires_at: new_session.expires_at,
            created_at: Utc::now(),
        };
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, AppError> {
        Ok(self
            .lock()
            .sessions
            .iter()
            .find(|s| s.token_hash == token_hash)
            .cloned())
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> Result<bool, AppError> {
        let mut tables = self.lock();
        let before = tables.sessions.len();
        tables.sessions.retain(|s| s.token_hash != token_hash);
        Ok(tables.sessions.len() < before)
    }

    async fn delete_for_user(
        &self,
        user_id: i64,
        keep_token_hash: Option<String>,
    ) -> Result<u64, AppError> {
        let mut tables = self.lock();
        let before = tables.sessions.len();
        tables.sessions.retain(|s| {
            s.user_id != user_id || keep_token_hash.as_deref() == Some(s.token_hash.as_str())
        });
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tables = self.lock();
        let before = tables.sessions.len();
        tables.sessions.retain(|s| s.expires_at > now);
        Ok((before - tables.sessions.len()) as u64)
    }
}
