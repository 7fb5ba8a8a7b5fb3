//! Request context types.
//!
//! The [`RequestContext`] is created per request by the HTTP adapter, filled
//! in by the handlers, and logged with the final response.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for each request.
///
/// Generated identifiers are UUID v7 strings. Identifiers received in an
/// `X-Request-ID` header are kept verbatim.
///
/// # Example
///
/// ```
/// use scoring_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.as_str().len(), 36);
///
/// let id = RequestId::from_header("abc-123");
/// assert_eq!(id.to_string(), "abc-123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Uses a caller-supplied identifier.
    #[must_use]
    pub fn from_header(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }
}

/// Per-request record attached to the completion log line.
///
/// `nclients` is set by `clients_interests`, `has` by `online_score`.
#[derive(Debug, Clone, Serialize)]
pub struct RequestContext {
    request_id: RequestId,

    #[serde(skip_serializing_if = "Option::is_none")]
    nclients: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    has: Option<Vec<String>>,

    #[serde(skip)]
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with the given request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            nclients: None,
            has: None,
            started_at: Instant::now(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Returns the number of requested clients, if set.
    #[must_use]
    pub const fn nclients(&self) -> Option<usize> {
        self.nclients
    }

    /// Records the number of requested clients.
    pub fn set_nclients(&mut self, nclients: usize) {
        self.nclients = Some(nclients);
    }

    /// Returns the filled argument names, if set.
    #[must_use]
    pub fn has(&self) -> Option<&[String]> {
        self.has.as_deref()
    }

    /// Records the filled argument names.
    pub fn set_has(&mut self, has: Vec<String>) {
        self.has = Some(has);
    }

    /// Returns the time elapsed since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
