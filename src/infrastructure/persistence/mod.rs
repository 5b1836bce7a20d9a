//! PostgreSQL repository implementations.
//!
//! Concrete implementations of the domain repository traits. Queries are
//! checked at runtime with `sqlx::query_as` and `FromRow` mappings.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link storage, owner listings and cleanup
//! - [`PgStatsRepository`] - Click recording and analytics queries
//! - [`PgUserRepository`] - User accounts and admin mutations
//! - [`PgSessionRepository`] - Login sessions

pub mod pg_link_repository;
pub mod pg_session_repository;
pub mod pg_stats_repository;
pub mod pg_user_repository;

pub use pg_link_repository::PgLinkRepository;
pub use pg_session_repository::PgSessionRepository;
pub use pg_stats_repository::PgStatsRepository;
pub use pg_user_repository::PgUserRepository;

/// Builds an `ILIKE` pattern matching `search` as a literal substring.
pub(crate) fn contains_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
