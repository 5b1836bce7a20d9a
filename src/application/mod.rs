//! Application layer services implementing business logic.
//!
//! Services orchestrate repository calls, validation and business rules, and
//! give HTTP handlers, the cleanup job and the admin CLI one API to call.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Link creation, redirects, owner management
//! - [`services::stats_service::StatsService`] - Click analytics
//! - [`services::admin_service::AdminService`] - User management
//! - [`services::auth_service::AuthService`] - Accounts, sessions, CSRF

pub mod pagination;
pub mod services;
