use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::scoring::ScoringError;

/// A rejected field, model or routing decision.
///
/// Construction is fail-fast: the first violation aborts and is reported
/// as-is, so every variant carries exactly one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A `required` field was absent from the raw mapping.
    Required(&'static str),
    /// A supplied value failed its kind rule.
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Human readable reason.
        reason: String,
    },
    /// A cross-field invariant of the schema does not hold.
    Invariant(String),
    /// The envelope names a method nobody serves.
    UnknownMethod(String),
    /// A mapping was expected (request body or `arguments`).
    NotAnObject(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Required(field) => write!(f, "{} is required", field),
            ValidationError::InvalidField { field, reason } => write!(f, "{}: {}", field, reason),
            ValidationError::Invariant(msg) => write!(f, "{}", msg),
            ValidationError::UnknownMethod(method) => write!(f, "unknown method: {}", method),
            ValidationError::NotAnObject(what) => write!(f, "{} must be a JSON object", what),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Application-specific error types.
///
/// Every variant is a terminal state of the request pipeline and maps to
/// one status code of the `{"error": ..., "code": ...}` envelope.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Body unreadable or not valid JSON.
    BadRequest(String),
    /// Credential digest mismatch.
    Forbidden,
    /// Unknown endpoint path.
    NotFound(String),
    /// Validation failure, surfaced to the caller verbatim.
    InvalidRequest(ValidationError),
    /// Anything not anticipated above.
    Internal(String),
}

impl AppError {
    /// Status code written both into the HTTP status line and the body.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed to the caller.
    ///
    /// Only validation failures are detailed; everything else falls back to
    /// the default message for its status.
    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidRequest(e) => e.to_string(),
            other => default_message(other.status()).to_string(),
        }
    }
}

/// Default error message for a status code.
pub fn default_message(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        422 => "Invalid Request",
        500 => "Internal Server Error",
        _ => "Unknown Error",
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Forbidden => write!(f, "Forbidden: authentication failed"),
            AppError::NotFound(path) => write!(f, "Not found: {}", path),
            AppError::InvalidRequest(e) => write!(f, "Invalid request: {}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Renders `{"error": <message>, "code": <status>}`.
    ///
    /// Logging happens once per request in the handler, not here.
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.public_message(),
            "code": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidRequest(err)
    }
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        AppError::Internal(err.to_string())
    }
}
