//! Object storage trait and error types.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage request failed: {0}")]
    Request(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Write-only blob store returning public URLs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` under `key` and returns the URL clients fetch it from.
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> StorageResult<String>;

    async fn health_check(&self) -> bool;
}

/// Keys are flat file names: ASCII alphanumerics, `-`, `_` and `.`, no `..`.
pub(super) fn check_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && !key.contains("..")
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
