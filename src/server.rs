//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache and storage setup, background tasks,
//! and the Axum server lifecycle.

use crate::api::routes::RateLimiting;
use crate::application::services::{AdminService, AuthService, LinkService, StatsService};
use crate::config::{Config, StorageConfig};
use crate::domain::click_worker::run_click_worker;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::oauth::{GoogleOAuth, IdentityProvider};
use crate::infrastructure::persistence::{
    PgLinkRepository, PgSessionRepository, PgStatsRepository, PgUserRepository,
};
use crate::infrastructure::storage::{HttpStorage, LocalStorage, ObjectStorage};
use crate::jobs::CleanupJob;
use crate::routes::{RouterOptions, app_router};
use crate::state::{AppState, HttpSettings};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Opens the PostgreSQL pool with the configured limits.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");
    Ok(pool)
}

async fn build_cache(config: &Config) -> Arc<dyn CacheService> {
    if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
                Arc::new(NullCache::new())
            }
        }
    } else {
        tracing::info!("Cache disabled (NullCache)");
        Arc::new(NullCache::new())
    }
}

async fn build_storage(config: &Config) -> Result<Arc<dyn ObjectStorage>> {
    match &config.storage {
        StorageConfig::Local { upload_dir } => {
            let storage = LocalStorage::new(
                upload_dir.as_str(),
                &format!("{}/uploads", config.public_base_url),
            );
            storage
                .ensure_root()
                .await
                .with_context(|| format!("Failed to create upload directory '{upload_dir}'"))?;
            tracing::info!("Storage: local ({upload_dir})");
            Ok(Arc::new(storage))
        }
        StorageConfig::Http {
            endpoint,
            token,
            public_url,
        } => {
            let storage = HttpStorage::new(endpoint, token.clone(), public_url)
                .context("Failed to configure HTTP object storage")?;
            tracing::info!("Storage: http");
            Ok(Arc::new(storage))
        }
    }
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (or NullCache fallback)
/// - Object storage for QR logos
/// - Background click worker and cleanup job
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Storage or OAuth setup fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let cache = build_cache(&config).await;
    let storage = build_storage(&config).await?;

    let pool = Arc::new(pool);
    let link_repository = Arc::new(PgLinkRepository::new(pool.clone()));
    let user_repository = Arc::new(PgUserRepository::new(pool.clone()));
    let session_repository = Arc::new(PgSessionRepository::new(pool.clone()));
    let stats_repository = Arc::new(PgStatsRepository::new(pool.clone()));

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);
    let click_worker = tokio::spawn(run_click_worker(
        click_rx,
        stats_repository.clone(),
        config.click_worker_concurrency,
    ));
    tracing::info!("Click worker started");

    let link_service = Arc::new(LinkService::new(
        link_repository.clone(),
        user_repository.clone(),
        cache.clone(),
        storage.clone(),
        click_tx,
        config.link_policy(),
    ));
    let stats_service = Arc::new(StatsService::new(
        link_repository.clone(),
        stats_repository,
    ));
    let admin_service = Arc::new(AdminService::new(
        user_repository.clone(),
        link_repository,
        session_repository.clone(),
        cache.clone(),
    ));
    let auth_service = Arc::new(AuthService::new(
        user_repository,
        session_repository,
        config.auth_settings(),
    ));

    let identity_provider: Option<Arc<dyn IdentityProvider>> = match config.google.clone() {
        Some(google) => Some(Arc::new(
            GoogleOAuth::new(google).context("Failed to configure Google sign-in")?,
        )),
        None => None,
    };

    let cleanup = CleanupJob::new(
        link_service.clone(),
        auth_service.clone(),
        config.cleanup_schedule()?,
        config.cleanup_timezone()?,
    );
    let cleanup_task = tokio::spawn(cleanup.run());

    let state = AppState {
        link_service,
        stats_service,
        admin_service,
        auth_service,
        identity_provider,
        cache,
        storage,
        http: HttpSettings::from_config(&config),
    };

    let upload_dir = match &config.storage {
        StorageConfig::Local { upload_dir } => Some(upload_dir.clone()),
        StorageConfig::Http { .. } => None,
    };

    let app = app_router(
        state,
        RouterOptions {
            rate_limiting: RateLimiting::PerIp {
                behind_proxy: config.behind_proxy,
            },
            cors_origin: config.cors_origin.clone(),
            upload_dir,
        },
    )?;

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router (and with it the last click sender) is gone; let the worker
    // drain what is queued.
    cleanup_task.abort();
    if let Err(e) = click_worker.await {
        tracing::error!(error = %e, "Click worker panicked");
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
