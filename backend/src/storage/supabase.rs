//! Supabase storage REST backend.
//!
//! Environment variables:
//! - `SUPABASE_URL`: Project URL (required)
//! - `SUPABASE_SERVICE_ROLE_KEY`: Service role key sent as bearer token (required)

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::StatusCode;

use super::{ObjectStorage, StorageBucket, StorageError, StorageResult};

const CACHE_SECONDS: u32 = 3600;

pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
}

impl SupabaseStorage {
    pub fn new(base_url: impl Into<String>, service_key: &str) -> StorageResult<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", service_key))
            .map_err(|e| StorageError::NotConfigured(format!("invalid service key: {}", e)))?;
        let apikey = HeaderValue::from_str(service_key)
            .map_err(|e| StorageError::NotConfigured(format!("invalid service key: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("apikey", apikey);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| StorageError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_env() -> StorageResult<Self> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| StorageError::NotConfigured("SUPABASE_URL must be set".to_string()))?;
        let key = std::env::var("SUPABASE_SERVICE_ROLE_KEY").map_err(|_| {
            StorageError::NotConfigured("SUPABASE_SERVICE_ROLE_KEY must be set".to_string())
        })?;
        Self::new(url, &key)
    }

    fn object_url(&self, bucket: StorageBucket, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, key)
    }
}

fn upstream(e: reqwest::Error) -> StorageError {
    StorageError::Upstream(e.to_string())
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        bucket: StorageBucket,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        let response = self
            .client
            .post(self.object_url(bucket, key))
            .header(CONTENT_TYPE, content_type)
            .header(CACHE_CONTROL, format!("max-age={}", CACHE_SECONDS))
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(upstream)?;

        let status = response.status();
        if status.is_success() {
            return Ok(self.public_url(bucket, key));
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT || body.contains("Duplicate") {
            return Err(StorageError::AlreadyExists {
                bucket,
                key: key.to_string(),
            });
        }
        Err(StorageError::Upstream(format!(
            "upload to {} returned {}: {}",
            bucket, status, body
        )))
    }

    fn public_url(&self, bucket: StorageBucket, key: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, key)
    }

    async fn delete(&self, bucket: StorageBucket, key: &str) -> bool {
        let result = self
            .client
            .delete(format!("{}/storage/v1/object/{}", self.base_url, bucket))
            .json(&serde_json::json!({ "prefixes": [key] }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                log::warn!(
                    "Failed to delete {}/{}: status {}",
                    bucket,
                    key,
                    response.status()
                );
                false
            }
            Err(e) => {
                log::warn!("Failed to delete {}/{}: {}", bucket, key, e);
                false
            }
        }
    }

    async fn exists(&self, bucket: StorageBucket, key: &str) -> StorageResult<bool> {
        let response = self
            .client
            .head(self.object_url(bucket, key))
            .send()
            .await
            .map_err(upstream)?;

        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Ok(false),
            s => Err(StorageError::Upstream(format!(
                "existence check on {} returned {}",
                bucket, s
            ))),
        }
    }
}
