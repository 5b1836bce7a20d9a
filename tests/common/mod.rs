#![allow(dead_code)]

pub mod memory;

use async_trait::async_trait;
use axum::ServiceExt;
use axum::extract::Request;
use axum_test::{TestRequest, TestServer};
use memory::MemoryStore;
use shortlink::AppError;
use shortlink::api::routes::RateLimiting;
use shortlink::application::services::{
    AdminService, AuthService, AuthSettings, LinkPolicy, LinkService, StatsService,
};
use shortlink::domain::click_worker::run_click_worker;
use shortlink::domain::entities::{Role, User};
use shortlink::infrastructure::cache::NullCache;
use shortlink::infrastructure::oauth::{IdentityProvider, OAuthIdentity};
use shortlink::infrastructure::storage::LocalStorage;
use shortlink::routes::{RouterOptions, app_router};
use shortlink::state::{AppState, HttpSettings};
use shortlink::utils::url_normalizer::service_host;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

pub const PASSWORD: &str = "correct-horse-battery";
pub const FRONTEND_URL: &str = "http://localhost:5173";

/// Identity provider that accepts the code `good-code`.
pub struct FakeGoogle {
    pub email: String,
}

#[async_trait]
impl IdentityProvider for FakeGoogle {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://accounts.example.test/auth?state={state}")
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthIdentity, AppError> {
        if code == "good-code" {
            Ok(OAuthIdentity {
                email: self.email.clone(),
                subject: "google-subject-1".to_string(),
            })
        } else {
            Err(AppError::unauthorized(
                "Code exchange failed",
                serde_json::json!({}),
            ))
        }
    }
}

/// Session cookie and CSRF token of a signed-in test user.
#[derive(Debug, Clone)]
pub struct Session {
    pub sid: String,
    pub csrf: String,
}

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub upload_dir: PathBuf,
}

fn upload_dir() -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    std::env::temp_dir().join(format!(
        "shortlink-test-{}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ))
}

pub fn create_test_state(
    store: Arc<MemoryStore>,
    upload_dir: &PathBuf,
    identity_provider: Option<Arc<dyn IdentityProvider>>,
) -> AppState {
    let http = HttpSettings {
        frontend_url: FRONTEND_URL.to_string(),
        ..HttpSettings::default()
    };

    let (tx, rx) = mpsc::channel(100);
    tokio::spawn(run_click_worker(rx, store.clone(), 4));

    let cache = Arc::new(NullCache::new());
    let storage = Arc::new(LocalStorage::new(
        upload_dir.clone(),
        &format!("{}/uploads", http.public_base_url),
    ));

    let link_service = Arc::new(LinkService::new(
        store.clone(),
        store.clone(),
        cache.clone(),
        storage.clone(),
        tx,
        LinkPolicy {
            service_host: service_host(&http.public_base_url),
            ..LinkPolicy::default()
        },
    ));
    let stats_service = Arc::new(StatsService::new(store.clone(), store.clone()));
    let admin_service = Arc::new(AdminService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        cache.clone(),
    ));
    let auth_service = Arc::new(AuthService::new(
        store.clone(),
        store.clone(),
        AuthSettings {
            session_secret: "test-session-secret-with-32-bytes!!".to_string(),
            session_ttl: chrono::Duration::hours(1),
            default_link_limit: 3,
        },
    ));

    AppState {
        link_service,
        stats_service,
        admin_service,
        auth_service,
        identity_provider,
        cache,
        storage,
        http,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(None).await
}

pub async fn spawn_app_with(identity_provider: Option<Arc<dyn IdentityProvider>>) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let upload_dir = upload_dir();
    let state = create_test_state(store.clone(), &upload_dir, identity_provider);

    let app = app_router(
        state.clone(),
        RouterOptions {
            rate_limiting: RateLimiting::Disabled,
            cors_origin: FRONTEND_URL.to_string(),
            upload_dir: Some(upload_dir.to_string_lossy().into_owned()),
        },
    )
    .unwrap();

    let server = TestServer::new(ServiceExt::<Request>::into_make_service(app)).unwrap();

    TestApp {
        server,
        store,
        state,
        upload_dir,
    }
}

impl TestApp {
    pub async fn create_user(&self, email: &str, role: Role) -> User {
        self.state
            .auth_service
            .create_user(email, PASSWORD, role)
            .await
            .unwrap()
    }

    /// Opens a session directly through the service.
    pub async fn login(&self, email: &str) -> Session {
        let grant = self.state.auth_service.login(email, PASSWORD).await.unwrap();
        Session {
            sid: grant.token,
            csrf: self.csrf(),
        }
    }

    pub async fn signed_in(&self, email: &str, role: Role) -> (User, Session) {
        let user = self.create_user(email, role).await;
        let session = self.login(email).await;
        (user, session)
    }

    pub fn csrf(&self) -> String {
        self.state.auth_service.issue_csrf_token().unwrap()
    }

    /// Waits for the click worker to persist `expected` clicks.
    pub async fn wait_for_clicks(&self, link_id: i64, expected: usize) {
        for _ in 0..50 {
            if self.store.clicks_for(link_id).len() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("click worker did not record {expected} clicks for link {link_id}");
    }
}

/// Attaches the session cookie and the double-submit CSRF pair.
pub fn as_user(request: TestRequest, session: &Session) -> TestRequest {
    request
        .add_header(
            "cookie",
            format!("sid={}; csrf_token={}", session.sid, session.csrf),
        )
        .add_header("x-csrf-token", session.csrf.clone())
}

/// Attaches only the CSRF pair, for anonymous writes.
pub fn with_csrf(request: TestRequest, token: &str) -> TestRequest {
    request
        .add_header("cookie", format!("csrf_token={token}"))
        .add_header("x-csrf-token", token.to_string())
}

/// Inserts a local account straight into the database.
pub async fn insert_user(pool: &sqlx::PgPool, email: &str, role: Role) -> i64 {
    sqlx::query_scalar("INSERT INTO users (email, role) VALUES ($1, $2) RETURNING id")
        .bind(email)
        .bind(role.as_str())
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Inserts a link straight into the database.
pub async fn insert_link(
    pool: &sqlx::PgPool,
    slug: &str,
    owner_id: Option<i64>,
    expired_at: chrono::DateTime<chrono::Utc>,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO links (slug, target_url, owner_id, expired_at) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(slug)
    .bind("https://example.com/")
    .bind(owner_id)
    .bind(expired_at)
    .fetch_one(pool)
    .await
    .unwrap()
}
