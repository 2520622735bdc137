//! Request extractors producing the raw records the services validate.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, FromRequest, FromRequestParts, Multipart, Query, Request},
    http::{header::CONTENT_TYPE, request::Parts, StatusCode},
};
use serde_json::Value;

use super::error::AppError;
use crate::services::validators::{require_id, Record};
use crate::services::Submission;
use crate::storage::Upload;

/// Name of the only file field accepted by upload endpoints.
pub const RECEIPT_FIELD: &str = "receipt";

/// Request body of an upload endpoint: `multipart/form-data` with text fields
/// and an optional `receipt` file, or a JSON object.
#[derive(Debug)]
pub struct Form(pub Submission);

impl<S> FromRequest<S> for Form
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            read_multipart(multipart).await.map(Form)
        } else {
            let JsonRecord(fields) = JsonRecord::from_request(req, state).await?;
            Ok(Form(Submission::new(fields)))
        }
    }
}

/// Map a failed multipart read; an over-limit body gets a readable message.
fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::bad_request("Upload exceeds the request size limit")
    } else {
        AppError::bad_request(e.body_text())
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<Submission, AppError> {
    let mut submission = Submission::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                if name != RECEIPT_FIELD {
                    return Err(AppError::bad_request(format!("Unexpected file field '{}'", name)));
                }
                if submission.receipt.is_some() {
                    return Err(AppError::bad_request("Only one receipt file is allowed"));
                }
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                submission.receipt = Some(Upload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            None => {
                let text = field.text().await.map_err(multipart_error)?;
                submission.fields.insert(name, Value::String(text));
            }
        }
    }
    Ok(submission)
}

/// A JSON object body. An empty body reads as an empty object.
#[derive(Debug)]
pub struct JsonRecord(pub Record);

impl<S> FromRequest<S> for JsonRecord
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonRecord(Record::new()));
        }
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(fields)) => Ok(JsonRecord(fields)),
            Ok(_) => Err(AppError::bad_request("Request body must be a JSON object")),
            Err(e) => Err(AppError::bad_request(format!("Invalid JSON body: {}", e))),
        }
    }
}

/// Query string parameters as a record of strings.
#[derive(Debug, Default)]
pub struct QueryRecord(pub Record);

impl<S> FromRequestParts<S> for QueryRecord
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        Ok(QueryRecord(
            pairs
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect(),
        ))
    }
}

/// Parse a path segment as a record id.
pub fn parse_id<T: From<i64>>(raw: &str) -> Result<T, AppError> {
    require_id(&Value::String(raw.to_string()), "id")
        .map(T::from)
        .map_err(AppError::from)
}
