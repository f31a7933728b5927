//! # spatialink-publish
//!
//! Durable publication of drawing payloads.
//!
//! Publishing pushes the already-serialized payload bytes to the remote
//! content store and falls back to the artist's local artifact store
//! when the remote side is unreachable. The caller always gets a usable
//! URI back; whether it points at the remote store or a local file is
//! carried in the result for status display. The bytes are stored
//! verbatim on both paths — publishing never re-serializes or mutates
//! payload contents.
//!
//! ## Modules
//!
//! - [`store`] — remote content-store client

pub mod store;

pub use store::{ContentStore, HttpContentStore};

use std::time::Duration;

use spatialink_store::ArtifactStore;

/// Error types for content-store operations.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The request could not be sent or the connection dropped.
    #[error("content store request failed: {0}")]
    Http(String),

    /// The store answered with a non-success status.
    #[error("content store returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The store answered 2xx but the body did not parse.
    #[error("content store response was malformed: {0}")]
    Malformed(String),

    /// The request exceeded the configured deadline.
    #[error("content store request timed out after {0:?}")]
    Timeout(Duration),
}

/// Convenience result type for content-store operations.
pub type Result<T> = std::result::Result<T, UploadError>;

/// Outcome of a publish: the locator plus whether the local fallback
/// was used.
#[derive(Clone, Debug)]
pub struct Published {
    pub uri: String,
    pub fallback: bool,
}

/// Publisher with a guaranteed local fallback.
pub struct MetadataPublisher<S> {
    store: S,
    artifacts: ArtifactStore,
    timeout: Duration,
}

impl<S: ContentStore> MetadataPublisher<S> {
    pub fn new(store: S, artifacts: ArtifactStore, timeout: Duration) -> Self {
        Self {
            store,
            artifacts,
            timeout,
        }
    }

    /// Publish serialized payload bytes.
    ///
    /// Every remote failure — timeout, rejection, transport error,
    /// malformed response — is absorbed by writing the same bytes to
    /// local storage and returning a `file://` URI with `fallback`
    /// set. The only error path left is local storage itself failing,
    /// which means the disk is gone.
    pub async fn publish(&self, bytes: &[u8]) -> std::result::Result<Published, spatialink_store::ArtifactError> {
        let remote = match tokio::time::timeout(self.timeout, self.store.put(bytes)).await {
            Ok(result) => result,
            Err(_) => Err(UploadError::Timeout(self.timeout)),
        };

        match remote {
            Ok(uri) => {
                tracing::info!(uri = %uri, bytes = bytes.len(), "metadata published");
                Ok(Published {
                    uri,
                    fallback: false,
                })
            }
            Err(err) => {
                tracing::warn!(error = %err, "remote publish failed, falling back to local storage");
                let uri = self.artifacts.save_metadata(bytes)?;
                Ok(Published {
                    uri,
                    fallback: true,
                })
            }
        }
    }
}
