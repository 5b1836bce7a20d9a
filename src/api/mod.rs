//! REST API layer for HTTP request/response handling.
//!
//! This layer translates HTTP requests into service calls and formats
//! responses according to API contracts.
//!
//! # Modules
//!
//! - [`dto`] - Data Transfer Objects for request/response serialization
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Session, CSRF, admin and rate-limit middleware
//! - [`extractors`] - Current user and click metadata extractors
//! - [`cookies`] - Cookie names and builders
//! - [`routes`] - Route configuration and composition

pub mod cookies;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
