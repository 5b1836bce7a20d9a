//! Background jobs running next to the HTTP server.
//!
//! - [`cleanup`] - Scheduled removal of expired anonymous links and sessions

pub mod cleanup;

pub use cleanup::{CleanupJob, CleanupReport};
