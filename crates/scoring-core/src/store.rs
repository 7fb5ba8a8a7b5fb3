//! Score and interest lookups.
//!
//! Handlers never compute scores or interests themselves. They call a
//! [`Store`] that is injected into every dispatch. [`MemoryStore`] is the
//! in-process implementation used by the binary and by tests.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by a [`Store`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backing store returned data that could not be interpreted.
    #[error("corrupt store data for key '{key}': {reason}")]
    Corrupt {
        /// The key being read.
        key: String,
        /// What was wrong with the value.
        reason: String,
    },
}

impl StoreError {
    /// Creates an [`StoreError::Unavailable`] error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Creates a [`StoreError::Corrupt`] error.
    #[must_use]
    pub fn corrupt(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// The scoring inputs of an `online_score` call.
///
/// Each field holds the argument rendered as text, or `None` when the
/// argument was absent or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreQuery {
    /// Phone number.
    pub phone: Option<String>,
    /// E-mail address.
    pub email: Option<String>,
    /// Birth date.
    pub birthday: Option<String>,
    /// Gender code.
    pub gender: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
}

/// Score and interest lookups used by the method handlers.
///
/// Implementations must be safe for concurrent reads.
pub trait Store: Send + Sync {
    /// Returns the score for the given inputs.
    fn get_score(&self, query: &ScoreQuery) -> Result<f64, StoreError>;

    /// Returns the interests of one client.
    fn get_interests(&self, client_id: &str) -> Result<Vec<String>, StoreError>;
}

/// In-memory [`Store`].
///
/// Interests live in a lock-protected table keyed by client id. Scores are
/// computed from which inputs are present.
///
/// # Example
///
/// ```
/// use scoring_core::{MemoryStore, ScoreQuery, Store};
///
/// let store = MemoryStore::new();
/// store.set_interests("1", vec!["books".into()]);
///
/// assert_eq!(store.get_interests("1").unwrap(), ["books"]);
/// assert!(store.get_interests("2").unwrap().is_empty());
///
/// let query = ScoreQuery {
///     phone: Some("79175002040".into()),
///     ..ScoreQuery::default()
/// };
/// assert_eq!(store.get_score(&query).unwrap(), 1.5);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    interests: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with interests.
    #[must_use]
    pub fn with_interests<I, K>(interests: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<String>)>,
        K: Into<String>,
    {
        let table = interests
            .into_iter()
            .map(|(client_id, values)| (client_id.into(), values))
            .collect();
        Self {
            interests: RwLock::new(table),
        }
    }

    /// Replaces the interests of one client.
    pub fn set_interests(&self, client_id: impl Into<String>, interests: Vec<String>) {
        self.interests.write().insert(client_id.into(), interests);
    }

    /// Returns the number of clients with stored interests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interests.read().len()
    }

    /// Returns `true` if no interests are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interests.read().is_empty()
    }
}

impl Store for MemoryStore {
    fn get_score(&self, query: &ScoreQuery) -> Result<f64, StoreError> {
        let mut score = 0.0;
        if query.phone.is_some() {
            score += 1.5;
        }
        if query.email.is_some() {
            score += 1.5;
        }
        if query.birthday.is_some() && query.gender.is_some() {
            score += 1.5;
        }
        if query.first_name.is_some() && query.last_name.is_some() {
            score += 0.5;
        }
        Ok(score)
    }

    fn get_interests(&self, client_id: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .interests
            .read()
            .get(client_id)
            .cloned()
            .unwrap_or_default())
    }
}
