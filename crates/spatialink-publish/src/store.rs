//! Remote content-store client.
//!
//! The store accepts opaque payload bytes and returns a locator. The
//! drawing contents mean nothing to it; serialization happened upstream
//! and the bytes are forwarded verbatim.

use async_trait::async_trait;
use serde::Deserialize;

use crate::{Result, UploadError};

/// A remote store that accepts opaque payload bytes and returns a URI.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn put(&self, body: &[u8]) -> Result<String>;
}

/// HTTP content store speaking the metadata server's JSON protocol:
/// `POST <base>/metadata` with the payload body, answered by
/// `{ "uri": "..." }`.
pub struct HttpContentStore {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    uri: String,
}

impl HttpContentStore {
    /// Create a client for the given store base URL (no trailing slash).
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| UploadError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn put(&self, body: &[u8]) -> Result<String> {
        let url = format!("{}/metadata", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_vec())
            .send()
            .await
            .map_err(|e| UploadError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PutResponse = resp
            .json()
            .await
            .map_err(|e| UploadError::Malformed(e.to_string()))?;
        Ok(parsed.uri)
    }
}
