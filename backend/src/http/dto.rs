//! Response bodies for the HTTP API.
//!
//! Every route except `/api/health` answers with the same envelope:
//! `{ "success": true, "data": ..., "message"? }` on success and
//! `{ "success": false, "error": ..., "details"? }` on failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version reported by health and deploy info.
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name reported by deploy info.
pub const SERVICE_NAME: &str = "Summer Fest Back Office API";

/// Successful response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Envelope<()> {
    /// Success without a payload, e.g. after a delete.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Failed response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`
    pub status: String,
    pub timestamp: DateTime<Utc>,
    /// Database connection status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Reason the check failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build and deployment information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployInfo {
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub environment: String,
    pub region: String,
    pub build_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_skips_missing_parts() {
        let body = serde_json::to_value(Envelope::data(vec![1, 2])).unwrap();
        assert_eq!(body, json!({"success": true, "data": [1, 2]}));

        let body = serde_json::to_value(Envelope::message("Deleted")).unwrap();
        assert_eq!(body, json!({"success": true, "message": "Deleted"}));
    }

    #[test]
    fn test_error_body() {
        let body = ErrorBody::new("Validation failed").with_details(json!(["Field 'city' is required"]));
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"success": false, "error": "Validation failed", "details": ["Field 'city' is required"]})
        );
    }
}
