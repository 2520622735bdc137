//! Service layer for business logic and orchestration.
//!
//! This module sits between the HTTP handlers and the persistence / storage
//! gateways. Every endpoint has one async function here that validates the
//! raw request, applies the cross-record rules and then calls the gateways.
//! Nothing in this layer knows about axum, so flows are tested directly
//! against [`crate::db::LocalRepository`] and [`crate::storage::LocalStorage`].

pub mod calculations;
pub mod error;
pub mod events;
pub mod expenses;
pub mod packages;
pub mod projection;
pub mod receipts;
pub mod sales;
pub mod slug;
pub mod stats;
pub mod validators;

pub use error::{ServiceError, ServiceResult};
pub use validators::{Record, ValidationFailure};

use crate::storage::Upload;
use validators::{field, require_bool, require_positive_integer, ValidationResult};

/// A request body: JSON or form fields plus an optional uploaded receipt.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub fields: Record,
    pub receipt: Option<Upload>,
}

impl Submission {
    pub fn new(fields: Record) -> Self {
        Self {
            fields,
            receipt: None,
        }
    }

    pub fn with_receipt(mut self, receipt: Upload) -> Self {
        self.receipt = Some(receipt);
        self
    }
}

/// `limit` query parameter, falling back to `default` when absent.
pub(crate) fn list_limit(query: &Record, default: usize) -> ValidationResult<usize> {
    match field(query, "limit") {
        None => Ok(default),
        Some(value) => require_positive_integer(value, "limit").map(|n| n as usize),
    }
}

/// Boolean query flag; absent means `false`.
pub(crate) fn query_flag(query: &Record, name: &str) -> ValidationResult<bool> {
    field(query, name).map_or(Ok(false), |value| require_bool(value, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_list_limit() {
        assert_eq!(list_limit(&query(json!({})), 100), Ok(100));
        assert_eq!(list_limit(&query(json!({"limit": "5"})), 100), Ok(5));
        assert!(list_limit(&query(json!({"limit": "0"})), 100).is_err());
        assert!(list_limit(&query(json!({"limit": "many"})), 100).is_err());
    }

    #[test]
    fn test_query_flag() {
        assert_eq!(query_flag(&query(json!({})), "active_only"), Ok(false));
        assert_eq!(query_flag(&query(json!({"active_only": "true"})), "active_only"), Ok(true));
        assert!(query_flag(&query(json!({"active_only": "yes"})), "active_only").is_err());
    }
}
