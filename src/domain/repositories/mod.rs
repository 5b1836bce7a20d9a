//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; PostgreSQL implementations
//! live in `crate::infrastructure::persistence`. Services receive them as
//! `Arc<dyn Trait>` so tests can swap in `mockall` mocks or in-memory fakes.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Link CRUD, owner listings and expiry cleanup
//! - [`StatsRepository`] - Click recording and aggregation
//! - [`UserRepository`] - Accounts and admin mutations
//! - [`SessionRepository`] - Server-side login sessions

pub mod link_repository;
pub mod session_repository;
pub mod stats_repository;
pub mod user_repository;

pub use link_repository::{LinkRepository, OwnerLinksQuery};
pub use session_repository::SessionRepository;
pub use stats_repository::StatsRepository;
pub use user_repository::{UserListQuery, UserRepository};

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use session_repository::MockSessionRepository;
#[cfg(test)]
pub use stats_repository::MockStatsRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
