//! HTTP error handling.
//!
//! Handlers return [`AppError`], a thin wrapper over the service error that
//! picks the status code and renders the error envelope. Upstream failures
//! never carry their cause in the body; the cause travels in a response
//! extension and [`expose_upstream_details`] copies it into the body when the
//! server runs in development.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::dto::ErrorBody;
use super::state::AppState;
use crate::services::{ServiceError, ValidationFailure};

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub struct AppError(pub ServiceError);

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(ServiceError::validation(message))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self(ServiceError::not_found(message))
    }
}

/// Cause of a 500 response, kept out of the body.
#[derive(Debug, Clone)]
pub struct UpstreamDetail(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.0 {
            ServiceError::Validation { message, details } => {
                let mut body = ErrorBody::new(message);
                if !details.is_empty() {
                    body = body.with_details(json!(details));
                }
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ServiceError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorBody::new(message))).into_response()
            }
            ServiceError::Conflict(message) => {
                (StatusCode::CONFLICT, Json(ErrorBody::new(message))).into_response()
            }
            ServiceError::Upstream(detail) => {
                tracing::error!(error = %detail, "upstream failure");
                let mut response = (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::new(INTERNAL_ERROR_MESSAGE)),
                )
                    .into_response();
                response.extensions_mut().insert(UpstreamDetail(detail));
                response
            }
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError(err)
    }
}

impl From<ValidationFailure> for AppError {
    fn from(failure: ValidationFailure) -> Self {
        AppError(failure.into())
    }
}

/// Response mapper: in development, show the cause of upstream failures.
pub async fn expose_upstream_details(State(state): State<AppState>, mut response: Response) -> Response {
    if !state.config.is_development() {
        return response;
    }
    let Some(UpstreamDetail(detail)) = response.extensions_mut().remove::<UpstreamDetail>() else {
        return response;
    };
    let body = ErrorBody::new(INTERNAL_ERROR_MESSAGE).with_details(json!(detail));
    (response.status(), Json(body)).into_response()
}
