//! HTTP object storage (S3-compatible gateways and similar).

use std::time::Duration;

use super::service::{ObjectStorage, StorageError, StorageResult, check_key};
use async_trait::async_trait;
use reqwest::{Client, header};
use tracing::{debug, warn};

/// Uploads objects with `PUT {endpoint}/{key}` and a bearer token.
pub struct HttpStorage {
    client: Client,
    endpoint: String,
    token: Option<String>,
    public_base: String,
}

impl HttpStorage {
    pub fn new(endpoint: &str, token: Option<String>, public_base: &str) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| StorageError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
            public_base: public_base.trim_end_matches('/').to_string(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.endpoint, key)
    }
}

#[async_trait]
impl ObjectStorage for HttpStorage {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> StorageResult<String> {
        check_key(key)?;

        let mut request = self
            .client
            .put(self.object_url(key))
            .header(header::CONTENT_TYPE, content_type)
            .body(bytes);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(key, %status, "Object store rejected upload");
            return Err(StorageError::Request(format!(
                "object store returned {status}"
            )));
        }

        debug!(key, "Uploaded object");
        Ok(format!("{}/{}", self.public_base, key))
    }

    async fn health_check(&self) -> bool {
        match self.client.head(&self.endpoint).send().await {
            Ok(response) => !response.status().is_server_error(),
            Err(_) => false,
        }
    }
}
