//! Request validators.
//!
//! Every validator takes a raw value (usually a field of a JSON object or a
//! multipart text field) and returns either the parsed value or a
//! [`ValidationFailure`] naming what is wrong. Nothing here performs I/O, so
//! handlers run all of them before the first gateway call.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;

/// A raw request body: JSON object fields or multipart text fields.
pub type Record = Map<String, Value>;

/// MIME types accepted for receipt uploads.
pub const ALLOWED_UPLOAD_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "application/pdf",
];

/// Maximum size of a single uploaded file (4 MiB).
pub const MAX_UPLOAD_BYTES: usize = 4 * 1024 * 1024;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Reason a value was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFailure {
    #[error("Field '{0}' is required")]
    MissingField(String),

    #[error("{0} must be a valid number")]
    NotANumber(String),

    #[error("{0} must be greater than 0")]
    NotPositive(String),

    #[error("{0} cannot be negative")]
    Negative(String),

    #[error("{0} must be a whole number")]
    NotAnInteger(String),

    #[error("{0} is out of range")]
    OutOfRange(String),

    #[error("{0} must be text")]
    WrongType(String),

    #[error("{label} must be at least {min} characters")]
    TooShort { label: String, min: usize },

    #[error("{label} cannot be longer than {max} characters")]
    TooLong { label: String, max: usize },

    #[error("{label} has an invalid format (expected {expected})")]
    InvalidFormat { label: String, expected: String },

    #[error("File type not allowed: {mime}. Allowed: {allowed}")]
    UnsupportedType { mime: String, allowed: String },

    #[error("File is too large ({size} bytes). Maximum allowed: {max_mb}MB")]
    TooLarge { size: usize, max_mb: usize },

    #[error("{label} must be one of: {allowed}")]
    InvalidChoice { label: String, allowed: String },

    #[error("{0} must be a non-empty list")]
    EmptyList(String),

    #[error("{label} cannot exceed {limit}")]
    ExceedsLimit { label: String, limit: String },

    #[error("{0} must be true or false")]
    NotABoolean(String),
}

pub type ValidationResult<T> = Result<T, ValidationFailure>;

/// Look up a field, treating `null` and blank strings as absent.
pub fn field<'a>(record: &'a Record, name: &str) -> Option<&'a Value> {
    match record.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(value),
    }
}

/// Fail with the first name in `names` that is absent, null or blank.
pub fn require_fields(record: &Record, names: &[&str]) -> ValidationResult<()> {
    match names.iter().find(|name| field(record, name).is_none()) {
        Some(missing) => Err(ValidationFailure::MissingField((*missing).to_string())),
        None => Ok(()),
    }
}

/// Look up a field that `require_fields` has already checked.
pub fn required<'a>(record: &'a Record, name: &str) -> ValidationResult<&'a Value> {
    field(record, name).ok_or_else(|| ValidationFailure::MissingField(name.to_string()))
}

/// Parse a JSON number or a numeric string. The whole string must be a
/// finite decimal; `"12abc"` is rejected.
pub fn parse_number(value: &Value, label: &str) -> ValidationResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| ValidationFailure::NotANumber(label.to_string()))
}

pub fn require_positive_number(value: &Value, label: &str) -> ValidationResult<f64> {
    let n = parse_number(value, label)?;
    if n <= 0.0 {
        return Err(ValidationFailure::NotPositive(label.to_string()));
    }
    Ok(n)
}

pub fn require_non_negative_number(value: &Value, label: &str) -> ValidationResult<f64> {
    let n = parse_number(value, label)?;
    if n < 0.0 {
        return Err(ValidationFailure::Negative(label.to_string()));
    }
    Ok(n)
}

/// Positive whole number that fits the `integer` columns (i32).
pub fn require_positive_integer(value: &Value, label: &str) -> ValidationResult<i32> {
    let n = require_positive_number(value, label)?;
    if n.fract() != 0.0 {
        return Err(ValidationFailure::NotAnInteger(label.to_string()));
    }
    if n > i32::MAX as f64 {
        return Err(ValidationFailure::OutOfRange(label.to_string()));
    }
    Ok(n as i32)
}

/// Positive whole number used as a record identifier.
pub fn require_id(value: &Value, label: &str) -> ValidationResult<i64> {
    let n = require_positive_number(value, label)?;
    if n.fract() != 0.0 {
        return Err(ValidationFailure::NotAnInteger(label.to_string()));
    }
    if n > i64::MAX as f64 {
        return Err(ValidationFailure::OutOfRange(label.to_string()));
    }
    Ok(n as i64)
}

/// Trimmed text whose length (in characters) lies within `min..=max`.
pub fn require_string(value: &Value, label: &str, min: usize, max: usize) -> ValidationResult<String> {
    let Value::String(raw) = value else {
        return Err(ValidationFailure::WrongType(label.to_string()));
    };
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len < min {
        return Err(ValidationFailure::TooShort {
            label: label.to_string(),
            min,
        });
    }
    if len > max {
        return Err(ValidationFailure::TooLong {
            label: label.to_string(),
            max,
        });
    }
    Ok(trimmed.to_string())
}

/// Optional free-text field: absent or blank yields `None`.
pub fn optional_string(record: &Record, name: &str, label: &str, max: usize) -> ValidationResult<Option<String>> {
    field(record, name)
        .map(|value| require_string(value, label, 1, max))
        .transpose()
}

pub fn require_email(value: &str) -> ValidationResult<()> {
    if EMAIL_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationFailure::InvalidFormat {
            label: "Email".to_string(),
            expected: "name@domain.tld".to_string(),
        })
    }
}

/// Strip spaces, dashes and parentheses; 7 to 15 digits must remain.
pub fn require_phone(value: &str) -> ValidationResult<()> {
    let digits: String = value
        .chars()
        .filter(|c| !(c.is_whitespace() || matches!(c, '-' | '(' | ')')))
        .collect();
    let len = digits.chars().count();
    if (7..=15).contains(&len) && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationFailure::InvalidFormat {
            label: "Phone".to_string(),
            expected: "7 to 15 digits".to_string(),
        })
    }
}

/// Make an uploaded file name safe for use as an object key.
///
/// Characters outside `[A-Za-z0-9.-]` become `_`, runs of `_` collapse to
/// one, underscores touching a `.` or either end are dropped, and the result
/// is lowercased. Sanitizing an already sanitized name returns it unchanged.
pub fn sanitize_filename(name: &str) -> String {
    let mut replaced = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            c
        } else {
            '_'
        };
        if c == '_' && replaced.ends_with('_') {
            continue;
        }
        replaced.push(c);
    }

    let cleaned = replaced
        .split('.')
        .map(|segment| segment.trim_matches('_'))
        .collect::<Vec<_>>()
        .join(".")
        .to_lowercase();

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

pub fn require_file_type(mime: &str, allowed: &[&str]) -> ValidationResult<()> {
    let wanted = mime.trim().to_lowercase();
    if allowed.iter().any(|a| *a == wanted) {
        return Ok(());
    }
    let short: Vec<&str> = allowed
        .iter()
        .map(|a| a.rsplit('/').next().unwrap_or(*a))
        .collect();
    Err(ValidationFailure::UnsupportedType {
        mime: mime.to_string(),
        allowed: short.join(", "),
    })
}

pub fn require_file_size(size: usize, max: usize) -> ValidationResult<()> {
    if size > max {
        return Err(ValidationFailure::TooLarge {
            size,
            max_mb: (max as f64 / (1024.0 * 1024.0)).round() as usize,
        });
    }
    Ok(())
}

/// Calendar date as `YYYY-MM-DD`; an RFC 3339 timestamp is reduced to its date.
pub fn require_date(value: &Value, label: &str) -> ValidationResult<NaiveDate> {
    let invalid = || ValidationFailure::InvalidFormat {
        label: label.to_string(),
        expected: "YYYY-MM-DD".to_string(),
    };
    let Value::String(raw) = value else {
        return Err(invalid());
    };
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| invalid())
}

/// Parse one of a fixed set of labels (e.g. a status enum).
pub fn require_choice<T: FromStr>(value: &Value, label: &str, allowed: &[&str]) -> ValidationResult<T> {
    let invalid = || ValidationFailure::InvalidChoice {
        label: label.to_string(),
        allowed: allowed.join(", "),
    };
    match value {
        Value::String(s) => s.parse::<T>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Non-empty list of ids, given either as a JSON array or as a string holding
/// a JSON-encoded array (multipart forms can only carry text).
pub fn require_id_list(value: &Value, label: &str) -> ValidationResult<Vec<i64>> {
    let decoded;
    let items = match value {
        Value::Array(items) => items,
        Value::String(s) => {
            decoded = serde_json::from_str::<Value>(s)
                .map_err(|_| ValidationFailure::EmptyList(label.to_string()))?;
            match &decoded {
                Value::Array(items) => items,
                _ => return Err(ValidationFailure::EmptyList(label.to_string())),
            }
        }
        _ => return Err(ValidationFailure::EmptyList(label.to_string())),
    };
    if items.is_empty() {
        return Err(ValidationFailure::EmptyList(label.to_string()));
    }
    items.iter().map(|item| require_id(item, label)).collect()
}

/// JSON boolean, or the strings `"true"` / `"false"` from a form.
pub fn require_bool(value: &Value, label: &str) -> ValidationResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(ValidationFailure::NotABoolean(label.to_string())),
    }
}

/// A JSON boolean only; strings are rejected.
pub fn require_json_bool(value: &Value, label: &str) -> ValidationResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| ValidationFailure::NotABoolean(label.to_string()))
}

/// Keep the value of a parse, recording its failure instead.
pub fn collect<T>(failures: &mut Vec<ValidationFailure>, result: ValidationResult<T>) -> Option<T> {
    result.map_err(|failure| failures.push(failure)).ok()
}

/// `Some(value)` when the key is sent; a present but empty value is rejected.
pub fn provided<T>(
    body: &Record,
    name: &str,
    parse: impl FnOnce(&Value) -> ValidationResult<T>,
) -> ValidationResult<Option<T>> {
    if !body.contains_key(name) {
        return Ok(None);
    }
    required(body, name).and_then(parse).map(Some)
}

/// Like [`provided`], but a present `null` or blank value clears the column.
pub fn nullable<T>(
    body: &Record,
    name: &str,
    parse: impl FnOnce(&Value) -> ValidationResult<T>,
) -> ValidationResult<Option<Option<T>>> {
    if !body.contains_key(name) {
        return Ok(None);
    }
    match field(body, name) {
        None => Ok(Some(None)),
        Some(value) => parse(value).map(|v| Some(Some(v))),
    }
}
