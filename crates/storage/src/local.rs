use std::path::PathBuf;

use async_trait::async_trait;

use crate::{ObjectStore, StorageError};

/// Objects are files below `root`; absolute keys are read as-is.
#[derive(Clone, Debug)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for LocalObjectStore {
    fn default() -> Self {
        Self::new(".")
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.root.join(key);
        tokio::fs::read(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound { location: self.location(), key: key.to_string() }
            } else {
                StorageError::Io { path: path.display().to_string(), source }
            }
        })
    }

    fn location(&self) -> String {
        format!("local directory `{}`", self.root.display())
    }
}
