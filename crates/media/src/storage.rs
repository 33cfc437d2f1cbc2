//! Object storage backends

use crate::MediaError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info};

/// Binary object store addressed by slash-separated paths
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` at `path` and return the public URL
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, MediaError>;

    /// Remove the object a public URL points to
    async fn delete(&self, url: &str) -> Result<(), MediaError>;
}

/// A stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Object storage kept in memory; URLs are `{base_url}/{path}`
pub struct MemoryObjectStorage {
    base_url: String,
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryObjectStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Creating in-memory object storage at {}", base_url);
        Self {
            base_url,
            objects: Mutex::new(HashMap::new()),
        }
    }

    /// Object stored at `path`
    pub fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects.lock().ok()?.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn path_of<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.base_url.as_str())?.strip_prefix('/')
    }
}

fn lock_error<T>(e: std::sync::PoisonError<T>) -> MediaError {
    MediaError::Storage(format!("Lock error: {}", e))
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, MediaError> {
        let size = bytes.len();
        self.objects.lock().map_err(lock_error)?.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        debug!("Stored {} bytes at {}", size, path);
        Ok(format!("{}/{}", self.base_url, path))
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        let path = self
            .path_of(url)
            .ok_or_else(|| MediaError::NotFound(url.to_string()))?;
        self.objects
            .lock()
            .map_err(lock_error)?
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| MediaError::NotFound(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let storage = MemoryObjectStorage::new("https://files.test/");
        let url = storage.put("deposits/a.png", vec![1, 2, 3], "image/png").await.unwrap();
        assert_eq!(url, "https://files.test/deposits/a.png");
        assert_eq!(storage.get("deposits/a.png").unwrap().content_type, "image/png");

        storage.delete(&url).await.unwrap();
        assert!(storage.is_empty());
        assert!(matches!(storage.delete(&url).await, Err(MediaError::NotFound(_))));
        assert!(matches!(
            storage.delete("https://elsewhere/x.png").await,
            Err(MediaError::NotFound(_))
        ));
    }
}
