//! In-memory object storage.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::{ObjectStorage, StorageBucket, StorageError, StorageResult};

const DEFAULT_BASE_URL: &str = "http://localhost/storage/v1/object/public";

/// A stored object.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-memory object store with the same no-overwrite rule as the remote one.
///
/// Clones share the same objects.
#[derive(Clone)]
pub struct LocalStorage {
    objects: Arc<RwLock<HashMap<(StorageBucket, String), StoredObject>>>,
    available: Arc<RwLock<bool>>,
    base_url: String,
}

impl LocalStorage {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
            available: Arc::new(RwLock::new(true)),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Make every call fail, for exercising upstream error paths.
    pub fn set_available(&self, available: bool) {
        *self.available.write() = available;
    }

    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }

    pub fn get(&self, bucket: StorageBucket, key: &str) -> Option<StoredObject> {
        self.objects.read().get(&(bucket, key.to_string())).cloned()
    }

    fn check_available(&self) -> StorageResult<()> {
        if *self.available.read() {
            Ok(())
        } else {
            Err(StorageError::Upstream("Storage is unavailable".to_string()))
        }
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn upload(
        &self,
        bucket: StorageBucket,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        self.check_available()?;
        let mut objects = self.objects.write();
        let slot = (bucket, key.to_string());
        if objects.contains_key(&slot) {
            return Err(StorageError::AlreadyExists {
                bucket,
                key: key.to_string(),
            });
        }
        objects.insert(
            slot,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(self.public_url(bucket, key))
    }

    fn public_url(&self, bucket: StorageBucket, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, bucket, key)
    }

    async fn delete(&self, bucket: StorageBucket, key: &str) -> bool {
        if let Err(e) = self.check_available() {
            log::warn!("Failed to delete {}/{}: {}", bucket, key, e);
            return false;
        }
        self.objects.write().remove(&(bucket, key.to_string())).is_some()
    }

    async fn exists(&self, bucket: StorageBucket, key: &str) -> StorageResult<bool> {
        self.check_available()?;
        Ok(self.objects.read().contains_key(&(bucket, key.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_then_delete() {
        let storage = LocalStorage::new();
        let url = storage
            .upload(StorageBucket::Receipts, "1-a.pdf", vec![1, 2, 3], "application/pdf")
            .await
            .unwrap();

        assert_eq!(url, "http://localhost/storage/v1/object/public/receipts/1-a.pdf");
        assert!(storage.exists(StorageBucket::Receipts, "1-a.pdf").await.unwrap());
        assert!(!storage.exists(StorageBucket::Documents, "1-a.pdf").await.unwrap());
        assert_eq!(
            storage.get(StorageBucket::Receipts, "1-a.pdf").unwrap().content_type,
            "application/pdf"
        );

        assert!(storage.delete(StorageBucket::Receipts, "1-a.pdf").await);
        assert!(!storage.delete(StorageBucket::Receipts, "1-a.pdf").await);
        assert_eq!(storage.object_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_refuses_overwrite() {
        let storage = LocalStorage::new();
        storage
            .upload(StorageBucket::Receipts, "k", vec![1], "image/png")
            .await
            .unwrap();
        let err = storage
            .upload(StorageBucket::Receipts, "k", vec![2], "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists { .. }));
        assert_eq!(storage.get(StorageBucket::Receipts, "k").unwrap().bytes, vec![1]);
    }

    #[tokio::test]
    async fn test_unavailable_storage() {
        let storage = LocalStorage::with_base_url("https://cdn.example/");
        assert_eq!(
            storage.public_url(StorageBucket::Documents, "x.pdf"),
            "https://cdn.example/documents/x.pdf"
        );

        storage.set_available(false);
        assert!(storage
            .upload(StorageBucket::Receipts, "k", vec![1], "image/png")
            .await
            .is_err());
        assert!(!storage.delete(StorageBucket::Receipts, "k").await);
    }
}
