//! Receipt files attached to sales and expenses.

use crate::services::error::ServiceResult;
use crate::services::validators::{
    require_file_size, require_file_type, ValidationResult, ALLOWED_UPLOAD_TYPES,
};
use crate::storage::{object_key, ObjectStorage, StorageBucket, Upload};

pub const RECEIPT_BUCKET: StorageBucket = StorageBucket::Receipts;

/// Check type and size of an uploaded receipt. Performs no I/O.
pub fn check(upload: &Upload, max_bytes: usize) -> ValidationResult<()> {
    require_file_type(&upload.content_type, ALLOWED_UPLOAD_TYPES)?;
    require_file_size(upload.size(), max_bytes)
}

/// Upload a checked receipt and return its object key.
pub async fn store(storage: &dyn ObjectStorage, upload: Upload) -> ServiceResult<String> {
    let key = object_key(&upload.file_name);
    storage
        .upload(RECEIPT_BUCKET, &key, upload.bytes, &upload.content_type)
        .await?;
    log::info!("Stored receipt {}/{}", RECEIPT_BUCKET, key);
    Ok(key)
}

/// Best-effort removal; a failure leaves an orphaned object and is only logged.
pub async fn discard(storage: &dyn ObjectStorage, key: &str) {
    if !storage.delete(RECEIPT_BUCKET, key).await {
        log::warn!("Receipt {}/{} was not removed", RECEIPT_BUCKET, key);
    }
}

pub fn public_url(storage: &dyn ObjectStorage, key: Option<&str>) -> Option<String> {
    key.map(|k| storage.public_url(RECEIPT_BUCKET, k))
}
