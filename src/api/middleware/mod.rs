//! HTTP middleware for request processing and protection.
//!
//! Provides session authentication, admin authorization, CSRF protection,
//! rate limiting, and observability middleware.

pub mod admin;
pub mod csrf;
pub mod rate_limit;
pub mod session;
pub mod tracing;
