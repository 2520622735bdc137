//! Object storage gateway for uploaded files.
//!
//! Receipts, documents and event images live in named buckets of an external
//! object store. Handlers only ever see the [`ObjectStorage`] trait; the
//! concrete backend is picked once at startup by [`StorageFactory`].
//!
//! - [`local`]: In-memory store for tests and local development
//! - `supabase`: Supabase storage REST API (feature `remote-storage`)

use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

use crate::define_label_enum;
use crate::services::validators::sanitize_filename;

pub mod local;
#[cfg(feature = "remote-storage")]
pub mod supabase;

pub use local::LocalStorage;
#[cfg(feature = "remote-storage")]
pub use supabase::SupabaseStorage;

define_label_enum!(
    /// Buckets provisioned in the object store.
    StorageBucket {
        Receipts => "receipts",
        Documents => "documents",
        EventImages => "event-images",
    }
);

/// A file received from a client, fully buffered in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Error type for object storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An object already exists under the key and overwrites are disabled.
    #[error("Object '{key}' already exists in bucket '{bucket}'")]
    AlreadyExists { bucket: StorageBucket, key: String },

    #[error("Storage is not configured: {0}")]
    NotConfigured(String),

    /// The store rejected or failed the request.
    #[error("Storage request failed: {0}")]
    Upstream(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Object store operations used by the service layer.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key`, refusing to overwrite; returns the public URL.
    async fn upload(
        &self,
        bucket: StorageBucket,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Public URL of an object. Does not check that the object exists.
    fn public_url(&self, bucket: StorageBucket, key: &str) -> String;

    /// Remove an object. Failures are logged and reported as `false`.
    async fn delete(&self, bucket: StorageBucket, key: &str) -> bool;

    async fn exists(&self, bucket: StorageBucket, key: &str) -> StorageResult<bool>;
}

/// Object key for an uploaded file: `{unix_millis}-{sanitized name}`.
pub fn object_key(file_name: &str) -> String {
    format!(
        "{}-{}",
        chrono::Utc::now().timestamp_millis(),
        sanitize_filename(file_name)
    )
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Local,
    Supabase,
}

impl FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            "supabase" | "remote" => Ok(Self::Supabase),
            _ => Err(format!("Unknown storage type: {}", s)),
        }
    }
}

impl StorageType {
    /// `STORAGE_TYPE` when set, otherwise Supabase if `SUPABASE_URL` is present.
    pub fn from_env() -> Result<Self, StorageError> {
        match std::env::var("STORAGE_TYPE") {
            Ok(value) => value.parse().map_err(StorageError::NotConfigured),
            Err(_) if std::env::var("SUPABASE_URL").is_ok() => Ok(Self::Supabase),
            Err(_) => Ok(Self::Local),
        }
    }
}

/// Builds the object storage gateway.
pub struct StorageFactory;

impl StorageFactory {
    pub fn create(storage_type: StorageType) -> StorageResult<Arc<dyn ObjectStorage>> {
        match storage_type {
            StorageType::Local => Ok(Arc::new(LocalStorage::new())),
            StorageType::Supabase => {
                #[cfg(feature = "remote-storage")]
                {
                    Ok(Arc::new(SupabaseStorage::from_env()?))
                }
                #[cfg(not(feature = "remote-storage"))]
                {
                    Err(StorageError::NotConfigured(
                        "remote-storage feature not enabled".to_string(),
                    ))
                }
            }
        }
    }

    pub fn from_env() -> StorageResult<Arc<dyn ObjectStorage>> {
        Self::create(StorageType::from_env()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_labels() {
        assert_eq!(StorageBucket::EventImages.as_str(), "event-images");
        assert_eq!("receipts".parse::<StorageBucket>().unwrap(), StorageBucket::Receipts);
    }

    #[test]
    fn test_object_key_is_timestamped_and_sanitized() {
        let key = object_key("Recibo Pago (1).PDF");
        let (millis, name) = key.split_once('-').unwrap();
        assert!(millis.parse::<i64>().unwrap() > 0);
        assert_eq!(name, "recibo_pago_1.pdf");
    }

    #[test]
    fn test_storage_type_from_str() {
        assert_eq!("local".parse::<StorageType>().unwrap(), StorageType::Local);
        assert_eq!("Supabase".parse::<StorageType>().unwrap(), StorageType::Supabase);
        assert!("s3".parse::<StorageType>().is_err());
    }

    #[cfg(not(feature = "remote-storage"))]
    #[test]
    fn test_supabase_requires_feature() {
        assert!(matches!(
            StorageFactory::create(StorageType::Supabase),
            Err(StorageError::NotConfigured(_))
        ));
    }
}
