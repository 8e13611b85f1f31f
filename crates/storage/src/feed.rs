use dealwise_core::config::{FeedConfig, FeedSource};
use dealwise_core::feed::UploadFeed;
use tracing::info;

use crate::{LocalObjectStore, ObjectStore, S3ObjectStore, StorageError};

/// `Ok(None)` when no feed source is configured.
pub async fn load_upload_feed(config: &FeedConfig) -> Result<Option<UploadFeed>, StorageError> {
    match config.source {
        FeedSource::None => Ok(None),
        FeedSource::Local => {
            let store = LocalObjectStore::default();
            let key = config.path.to_string_lossy();
            read_feed(&store, &key).await.map(Some)
        }
        FeedSource::S3 => {
            let store = S3ObjectStore::from_config(config).await?;
            read_feed(&store, &config.key).await.map(Some)
        }
    }
}

pub async fn read_feed(store: &dyn ObjectStore, key: &str) -> Result<UploadFeed, StorageError> {
    let bytes = store.fetch(key).await?;
    let feed = UploadFeed::parse(bytes.as_slice())?;
    info!(
        event_name = "storage.feed.loaded",
        location = %store.location(),
        key,
        rows = feed.len(),
        "upload feed loaded"
    );
    Ok(feed)
}
