//! The request envelope and the closed set of methods.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Login that receives the fixed admin score and hour-bucketed tokens.
pub const ADMIN_LOGIN: &str = "admin";

/// A method exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Computes a score from personal data.
    OnlineScore,
    /// Looks up interests for a list of clients.
    ClientsInterests,
}

impl Method {
    /// Every method, in a stable order.
    pub const ALL: [Self; 2] = [Self::OnlineScore, Self::ClientsInterests];

    /// Returns the wire name of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OnlineScore => "online_score",
            Self::ClientsInterests => "clients_interests",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a method name is outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown method '{0}'")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// The validated outer request.
///
/// Built from a JSON object that already passed
/// [`METHOD_REQUEST`](crate::schema::METHOD_REQUEST) validation, so every
/// required key is present. Values are not type-checked: a non-string
/// scalar is kept as its JSON text, and `null` becomes empty.
///
/// # Example
///
/// ```
/// use scoring_core::MethodRequest;
/// use serde_json::json;
///
/// let body = json!({
///     "account": "horns&hoofs",
///     "login": "admin",
///     "token": "",
///     "method": "online_score",
///     "arguments": {"phone": 79175002040u64}
/// });
///
/// let request = MethodRequest::from_object(body.as_object().unwrap());
/// assert!(request.is_admin());
/// assert_eq!(request.account.as_deref(), Some("horns&hoofs"));
/// assert_eq!(request.arguments["phone"], 79175002040u64);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MethodRequest {
    /// Partner account, if any.
    pub account: Option<String>,
    /// Caller login.
    pub login: String,
    /// Authentication token.
    pub token: String,
    /// Requested method name.
    pub method: String,
    /// Method arguments.
    pub arguments: Map<String, Value>,
}

impl MethodRequest {
    /// Builds the envelope from a JSON object.
    ///
    /// `arguments` that is not an object is treated as empty.
    #[must_use]
    pub fn from_object(data: &Map<String, Value>) -> Self {
        let text = |key: &str| data.get(key).and_then(value_text);

        Self {
            account: text("account"),
            login: text("login").unwrap_or_default(),
            token: text("token").unwrap_or_default(),
            method: text("method").unwrap_or_default(),
            arguments: match data.get("arguments") {
                Some(Value::Object(arguments)) => arguments.clone(),
                _ => Map::new(),
            },
        }
    }

    /// Returns `true` if the caller is the admin login.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.login == ADMIN_LOGIN
    }
}

/// Renders a JSON value as text.
///
/// Strings are returned as-is, `null` as `None`, everything else as its JSON
/// text.
pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
