//! Error type shared by the per-endpoint services.

use thiserror::Error;

use crate::db::repository::RepositoryError;
use crate::services::projection::ProjectionError;
use crate::services::validators::ValidationFailure;
use crate::storage::StorageError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was rejected before reaching a gateway, or failed a
    /// cross-record rule (e.g. a subcategory outside its category).
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },

    #[error("{0}")]
    NotFound(String),

    /// A uniqueness or referential rule refused the operation.
    #[error("{0}")]
    Conflict(String),

    /// The database or object store failed.
    #[error("{0}")]
    Upstream(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// A validation error listing every failed field.
    pub fn invalid_fields(failures: Vec<ValidationFailure>) -> Self {
        Self::Validation {
            message: "Validation failed".to_string(),
            details: failures.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }
}

impl From<ValidationFailure> for ServiceError {
    fn from(failure: ValidationFailure) -> Self {
        Self::validation(failure.to_string())
    }
}

impl From<ProjectionError> for ServiceError {
    fn from(err: ProjectionError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { message, .. } => Self::NotFound(message),
            RepositoryError::ConflictError { message, .. } => Self::Conflict(message),
            RepositoryError::ValidationError { message, .. } => Self::validation(message),
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::AlreadyExists { .. } => Self::Conflict(err.to_string()),
            other => Self::Upstream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageBucket;

    #[test]
    fn test_repository_errors_map_by_kind() {
        assert!(matches!(
            ServiceError::from(RepositoryError::not_found("Event 3")),
            ServiceError::NotFound(m) if m == "Event 3"
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::conflict("slug taken")),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::validation("bad amount")),
            ServiceError::Validation { .. }
        ));
        let upstream = ServiceError::from(RepositoryError::connection("pool exhausted"));
        assert!(upstream.is_upstream());
        assert!(upstream.to_string().contains("pool exhausted"));
    }

    #[test]
    fn test_storage_errors_map_by_kind() {
        let exists = StorageError::AlreadyExists {
            bucket: StorageBucket::Receipts,
            key: "k".to_string(),
        };
        assert!(matches!(ServiceError::from(exists), ServiceError::Conflict(_)));
        assert!(ServiceError::from(StorageError::Upstream("503".to_string())).is_upstream());
    }

    #[test]
    fn test_invalid_fields_lists_every_failure() {
        let err = ServiceError::invalid_fields(vec![
            ValidationFailure::MissingField("city".to_string()),
            ValidationFailure::NotPositive("Ticket price".to_string()),
        ]);
        match err {
            ServiceError::Validation { message, details } => {
                assert_eq!(message, "Validation failed");
                assert_eq!(details.len(), 2);
                assert_eq!(details[0], "Field 'city' is required");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
