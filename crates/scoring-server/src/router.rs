//! Path routing.
//!
//! The API exposes a single endpoint. Paths are compared after stripping
//! leading and trailing slashes, so `/method`, `method/` and `//method//`
//! all resolve to [`Route::Method`].

use std::collections::HashMap;
use std::fmt;

/// A known endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// The RPC endpoint, `POST /method`.
    Method,
}

impl Route {
    /// All routes served by the API.
    pub const ALL: [Self; 1] = [Self::Method];

    /// Returns the route's path without slashes.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Method => "method",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path())
    }
}

/// Maps trimmed request paths to [`Route`]s.
///
/// # Example
///
/// ```rust
/// use scoring_server::{Route, Router};
///
/// let router = Router::new();
/// assert_eq!(router.match_path("/method/"), Some(Route::Method));
/// assert_eq!(router.match_path("/other"), None);
/// ```
#[derive(Debug, Clone)]
pub struct Router {
    routes: HashMap<&'static str, Route>,
}

impl Router {
    /// Creates a router serving every [`Route`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Route::ALL.into_iter().map(|r| (r.path(), r)).collect(),
        }
    }

    /// Returns the route for `path`, if any.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<Route> {
        self.routes.get(path.trim_matches('/')).copied()
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_trims_slashes() {
        let router = Router::new();
        for path in ["/method", "method", "/method/", "//method//"] {
            assert_eq!(router.match_path(path), Some(Route::Method), "{path}");
        }
    }

    #[test]
    fn test_unknown_paths() {
        let router = Router::new();
        for path in ["/", "", "/methods", "/method/extra", "/api/method"] {
            assert_eq!(router.match_path(path), None, "{path}");
        }
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(Router::new().match_path("/Method"), None);
    }

    #[test]
    fn test_route_display() {
        assert_eq!(Route::Method.to_string(), "/method");
        assert_eq!(Router::new().len(), Route::ALL.len());
    }
}
