//! # Scoring Core
//!
//! Request schemas, validation, authentication and method dispatch for the
//! scoring API.
//!
//! This crate is transport-free. It provides:
//!
//! - [`Schema`] / [`Field`] - immutable per-request-shape field declarations
//! - [`validate`] - evaluates a schema against a JSON object
//! - [`check_auth`] - salted SHA-512 token check
//! - [`MethodRequest`] - the validated request envelope
//! - [`Dispatcher`] - maps a [`Method`] to its [`MethodHandler`]
//! - [`Store`] - score and interest lookups used by the handlers
//! - [`ApiError`] - the error taxonomy and its status code mapping
//!
//! ## Example
//!
//! ```
//! use scoring_core::{schema, validate};
//! use serde_json::json;
//!
//! let data = json!({"client_ids": [1, 2]});
//! let result = validate(&schema::CLIENTS_INTERESTS_REQUEST, data.as_object().unwrap());
//! assert!(result.is_valid());
//! ```

#![doc(html_root_url = "https://docs.rs/scoring-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
mod context;
mod dispatch;
mod error;
pub mod handler;
mod request;
pub mod schema;
pub mod store;
mod validator;

pub use auth::{check_auth, check_auth_at};
pub use context::{RequestContext, RequestId};
pub use dispatch::{DispatchError, Dispatcher, DispatcherBuilder};
pub use error::{ApiError, ApiResult, ErrorCategory, ErrorPayload};
pub use handler::MethodHandler;
pub use request::{Method, MethodRequest, UnknownMethod};
pub use schema::{Field, FieldConstraint, FieldKind, Schema};
pub use store::{MemoryStore, ScoreQuery, Store, StoreError};
pub use validator::{is_truthy, validate, FieldViolation, ValidationResult};
