//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint: it extracts the raw request,
//! delegates to the matching function in [`crate::services`] and wraps the
//! result in the response envelope.

use axum::{http::StatusCode, Json};

use super::dto::Envelope;
use super::error::AppError;

pub mod calculations;
pub mod events;
pub mod expenses;
pub mod packages;
pub mod sales;
pub mod system;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<Envelope<T>>, AppError>;

/// Result type for handlers that create a record.
pub type CreatedResult<T> = Result<(StatusCode, Json<Envelope<T>>), AppError>;

pub(crate) fn ok<T>(data: T) -> HandlerResult<T> {
    Ok(Json(Envelope::data(data)))
}

pub(crate) fn ok_with<T>(data: T, message: impl Into<String>) -> HandlerResult<T> {
    Ok(Json(Envelope::data(data).with_message(message)))
}

pub(crate) fn created<T>(data: T, message: impl Into<String>) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(Envelope::data(data).with_message(message))))
}

pub(crate) fn done(message: impl Into<String>) -> HandlerResult<()> {
    Ok(Json(Envelope::message(message)))
}
