//! Business logic services for the application layer.

pub mod admin_service;
pub mod auth_service;
pub mod link_service;
pub mod password;
pub mod stats_service;

pub use admin_service::{AdminService, UserPage};
pub use auth_service::{AuthService, AuthSettings, Authenticated, SessionGrant};
pub use link_service::{ClickQueueStatus, LinkPolicy, LinkService, LinkUpdate, OwnerLinks};
pub use stats_service::{LinkStats, StatsService};
