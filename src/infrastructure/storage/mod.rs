//! Object storage for uploaded QR logo images.
//!
//! Provides an [`ObjectStorage`] trait with two implementations, selected by
//! `STORAGE_DRIVER`:
//! - [`LocalStorage`] - Files on local disk, served by the app at `/uploads`
//! - [`HttpStorage`] - Objects `PUT` to an HTTP object store

mod http_storage;
mod local_storage;
mod service;

pub use http_storage::HttpStorage;
pub use local_storage::LocalStorage;
#[cfg(test)]
pub use service::MockObjectStorage;
pub use service::{ObjectStorage, StorageError, StorageResult};
