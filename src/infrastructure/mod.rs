//! Infrastructure layer for external integrations.
//!
//! Concrete implementations of the domain repository traits and of the
//! collaborators services depend on.
//!
//! # Modules
//!
//! - [`cache`] - Redirect cache (Redis and no-op implementations)
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`storage`] - Object storage for QR logo uploads
//! - [`oauth`] - Google OAuth client

pub mod cache;
pub mod oauth;
pub mod persistence;
pub mod storage;
