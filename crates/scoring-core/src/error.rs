//! Error types for the scoring API.
//!
//! Every failure a request can end with is an [`ApiError`]. Each variant maps
//! to exactly one [`ErrorCategory`], which fixes the HTTP status code and the
//! generic message shown to the caller.
//!
//! | Category | Status | Generic message |
//! |---|---|---|
//! | `BadRequest` | 400 | `Bad Request` |
//! | `Forbidden` | 403 | `Forbidden` |
//! | `NotFound` | 404 | `Not Found` |
//! | `MethodNotAllowed` | 405 | `Method Not Allowed` |
//! | `InvalidRequest` | 422 | `Invalid Request` |
//! | `Internal` | 500 | `Internal Server Error` |
//!
//! Only `InvalidRequest` carries a caller-visible payload. The messages of
//! the other variants are for logs.

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::store::StoreError;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Categories of errors, one per response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed request bytes or JSON.
    BadRequest,
    /// Authentication failed.
    Forbidden,
    /// Unknown route or method.
    NotFound,
    /// HTTP method other than `POST`.
    MethodNotAllowed,
    /// Schema validation failed.
    InvalidRequest,
    /// Unexpected fault while handling.
    Internal,
}

impl ErrorCategory {
    /// Returns the HTTP status code for this category.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidRequest => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the generic message sent when no specific payload exists.
    #[must_use]
    pub const fn default_message(&self) -> &'static str {
        match self {
            Self::BadRequest => "Bad Request",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::InvalidRequest => "Invalid Request",
            Self::Internal => "Internal Server Error",
        }
    }
}

/// The caller-visible content of the `error` key.
///
/// A single message for argument validation failures, the full ordered list
/// for envelope validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    /// One message.
    Message(String),
    /// Ordered list of messages.
    List(Vec<String>),
}

impl ErrorPayload {
    /// Returns `true` if there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Message(message) => message.is_empty(),
            Self::List(messages) => messages.is_empty(),
        }
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(message) => f.write_str(message),
            Self::List(messages) => f.write_str(&messages.join("; ")),
        }
    }
}

impl From<String> for ErrorPayload {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for ErrorPayload {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<Vec<String>> for ErrorPayload {
    fn from(messages: Vec<String>) -> Self {
        Self::List(messages)
    }
}

/// Standard error type for the scoring API.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use scoring_core::ApiError;
///
/// let error = ApiError::invalid_request("insufficient parameters");
/// assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
/// assert_eq!(
///     error.to_envelope().to_string(),
///     r#"{"code":422,"error":"insufficient parameters"}"#
/// );
/// ```
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request could not be read or parsed.
    #[error("Bad request: {message}")]
    BadRequest {
        /// Detail for logs.
        message: String,
    },

    /// Authentication failed.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Detail for logs.
        message: String,
    },

    /// Unknown route or method.
    #[error("Not found: {message}")]
    NotFound {
        /// Detail for logs.
        message: String,
    },

    /// HTTP method other than `POST`.
    #[error("Method not allowed: {message}")]
    MethodNotAllowed {
        /// Detail for logs.
        message: String,
    },

    /// Schema validation failed.
    #[error("Invalid request: {payload}")]
    InvalidRequest {
        /// Message or message list returned to the caller.
        payload: ErrorPayload,
    },

    /// Unexpected fault while handling.
    #[error("Internal error: {message}")]
    Internal {
        /// Detail for logs.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ApiError {
    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a method not allowed error.
    #[must_use]
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            message: message.into(),
        }
    }

    /// Creates an invalid request error with a caller-visible payload.
    #[must_use]
    pub fn invalid_request(payload: impl Into<ErrorPayload>) -> Self {
        Self::InvalidRequest {
            payload: payload.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::BadRequest { .. } => ErrorCategory::BadRequest,
            Self::Forbidden { .. } => ErrorCategory::Forbidden,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::MethodNotAllowed { .. } => ErrorCategory::MethodNotAllowed,
            Self::InvalidRequest { .. } => ErrorCategory::InvalidRequest,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().status_code()
    }

    /// Returns what the caller sees under the `error` key.
    ///
    /// Falls back to the category's generic message when no payload exists.
    #[must_use]
    pub fn payload(&self) -> ErrorPayload {
        match self {
            Self::InvalidRequest { payload } if !payload.is_empty() => payload.clone(),
            _ => ErrorPayload::Message(self.category().default_message().to_string()),
        }
    }

    /// Builds the JSON response body `{"error": ..., "code": ...}`.
    #[must_use]
    pub fn to_envelope(&self) -> Value {
        json!({
            "error": self.payload(),
            "code": self.status_code().as_u16(),
        })
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self::internal_with_source("store lookup failed", error)
    }
}
