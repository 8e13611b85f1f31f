use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{ObjectStore, StorageError};

#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryObjectStore {
    pub async fn put(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let mut objects = self.objects.write().await;
        objects.insert(key.into(), bytes.into());
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let objects = self.objects.read().await;
        objects.get(key).cloned().ok_or_else(|| StorageError::NotFound {
            location: self.location(),
            key: key.to_string(),
        })
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
