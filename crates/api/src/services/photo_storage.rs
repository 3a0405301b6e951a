//! Photo storage on the local filesystem.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use domain::services::PhotoStore;
use domain::StoreError;
use tracing::debug;

/// Writes photos under a root directory and returns URLs under a public prefix.
#[derive(Debug, Clone)]
pub struct LocalPhotoStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalPhotoStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolves `key` below the root, rejecting anything that could escape it.
    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StoreError::Backend(format!("Invalid photo key: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl PhotoStore for LocalPhotoStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Backend(format!("Failed to create photo directory: {}", e)))?;
        }

        let size = bytes.len();
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to write photo: {}", e)))?;

        debug!(key = %key, content_type = %content_type, size = size, "Photo stored");
        Ok(format!("{}/{}", self.public_base_url, key))
    }
}
