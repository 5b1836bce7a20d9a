//! Local-disk object storage.

use std::path::PathBuf;

use super::service::{ObjectStorage, StorageResult, check_key};
use async_trait::async_trait;
use tracing::debug;

/// Writes objects into a directory that the server exposes under `/uploads`.
pub struct LocalStorage {
    root: PathBuf,
    public_base: String,
}

impl LocalStorage {
    /// `public_base` is the URL prefix objects are served from, e.g.
    /// `https://s.example.com/uploads`.
    pub fn new(root: impl Into<PathBuf>, public_base: &str) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    /// Creates the upload directory if missing.
    pub async fn ensure_root(&self) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn put(&self, key: &str, _content_type: &str, bytes: Vec<u8>) -> StorageResult<String> {
        check_key(key)?;
        self.ensure_root().await?;

        let path = self.root.join(key);
        tokio::fs::write(&path, &bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "Stored object on disk");

        Ok(format!("{}/{}", self.public_base, key))
    }

    async fn health_check(&self) -> bool {
        tokio::fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("shortlink-{name}-{}", std::process::id()))
    }

    #[tokio::test]
    async fn test_put_writes_file_and_returns_url() {
        let root = temp_root("put");
        let storage = LocalStorage::new(&root, "http://localhost:3000/uploads/");

        let url = storage
            .put("logo.png", "image/png", b"png-bytes".to_vec())
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:3000/uploads/logo.png");
        assert_eq!(tokio::fs::read(root.join("logo.png")).await.unwrap(), b"png-bytes");
        assert!(storage.health_check().await);

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_put_rejects_traversal() {
        let storage = LocalStorage::new(temp_root("traversal"), "http://localhost/uploads");
        assert!(storage.put("../x.png", "image/png", vec![1]).await.is_err());
    }
}
