pub mod feed;
pub mod local;
pub mod memory;
pub mod s3;

use async_trait::async_trait;
use dealwise_core::errors::ApplicationError;
use dealwise_core::feed::FeedError;
use thiserror::Error;

pub use feed::load_upload_feed;
pub use local::LocalObjectStore;
pub use memory::InMemoryObjectStore;
pub use s3::S3ObjectStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing credential: {0}")]
    MissingCredential(String),
    #[error("object `{key}` not found in {location}")]
    NotFound { location: String, key: String },
    #[error("could not read `{path}`: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("object storage failure: {0}")]
    Backend(String),
    #[error(transparent)]
    Feed(#[from] FeedError),
}

impl StorageError {
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingCredential(_))
    }
}

impl From<StorageError> for ApplicationError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::MissingCredential(message) => Self::MissingCredential(message),
            other => Self::Upstream(other.to_string()),
        }
    }
}

/// Read-only access to named blobs, local or remote.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Human-readable location used in logs and diagnostics.
    fn location(&self) -> String;
}
