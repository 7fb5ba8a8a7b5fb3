//! Method handlers.
//!
//! A [`MethodHandler`] validates the arguments of one [`Method`], calls the
//! [`Store`] and returns the `response` value. Validation failures surface
//! only the first violation.

use serde_json::{Map, Value};

use crate::context::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::request::{value_text, Method, MethodRequest};
use crate::schema::{self, Schema};
use crate::store::{ScoreQuery, Store};
use crate::validator::{is_filled, is_truthy, validate};

/// Score returned to the admin login without consulting the store.
pub const ADMIN_SCORE: i64 = 42;

/// Message returned when `online_score` lacks a usable pair of arguments.
pub const INSUFFICIENT_PARAMETERS: &str = "insufficient parameters";

/// Handles the arguments of one method.
///
/// # Example
///
/// ```
/// use scoring_core::handler::{ClientsInterestsHandler, MethodHandler};
/// use scoring_core::{MemoryStore, MethodRequest, RequestContext};
/// use serde_json::json;
///
/// let store = MemoryStore::with_interests([("1", vec!["books".to_string()])]);
/// let request = MethodRequest {
///     arguments: json!({"client_ids": [1]}).as_object().unwrap().clone(),
///     ..MethodRequest::default()
/// };
///
/// let mut ctx = RequestContext::new();
/// let response = ClientsInterestsHandler.handle(&request, &mut ctx, &store).unwrap();
/// assert_eq!(response, json!({"1": ["books"]}));
/// assert_eq!(ctx.nclients(), Some(1));
/// ```
pub trait MethodHandler: Send + Sync + 'static {
    /// Returns the method this handler serves.
    fn method(&self) -> Method;

    /// Returns the schema of the method arguments.
    fn schema(&self) -> &'static Schema;

    /// Handles a request whose envelope is already validated and authorized.
    fn handle(
        &self,
        request: &MethodRequest,
        ctx: &mut RequestContext,
        store: &dyn Store,
    ) -> ApiResult<Value>;
}

/// Validates `arguments`, returning the first violation as an error.
fn validate_arguments(schema: &Schema, arguments: &Map<String, Value>) -> ApiResult<Vec<String>> {
    let result = validate(schema, arguments);
    match result.first_error() {
        Some(message) => Err(ApiError::invalid_request(message)),
        None => Ok(result.into_filled_fields()),
    }
}

/// `online_score`: scores a client from personal data.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnlineScoreHandler;

impl OnlineScoreHandler {
    /// Returns `true` if at least one argument pair is filled.
    #[must_use]
    pub fn has_enough_information(arguments: &Map<String, Value>) -> bool {
        let filled = |name: &str| is_filled(arguments, name);
        (filled("email") && filled("phone"))
            || (filled("first_name") && filled("last_name"))
            || (filled("gender") && filled("birthday"))
    }

    fn score_query(arguments: &Map<String, Value>) -> ScoreQuery {
        let text = |name: &str| {
            arguments
                .get(name)
                .filter(|value| is_truthy(value))
                .and_then(value_text)
        };

        ScoreQuery {
            phone: text("phone"),
            email: text("email"),
            birthday: text("birthday"),
            gender: text("gender"),
            first_name: text("first_name"),
            last_name: text("last_name"),
        }
    }
}

impl MethodHandler for OnlineScoreHandler {
    fn method(&self) -> Method {
        Method::OnlineScore
    }

    fn schema(&self) -> &'static Schema {
        &schema::ONLINE_SCORE_REQUEST
    }

    fn handle(
        &self,
        request: &MethodRequest,
        ctx: &mut RequestContext,
        store: &dyn Store,
    ) -> ApiResult<Value> {
        let arguments = &request.arguments;
        if !Self::has_enough_information(arguments) {
            return Err(ApiError::invalid_request(INSUFFICIENT_PARAMETERS));
        }

        let filled = validate_arguments(self.schema(), arguments)?;
        ctx.set_has(filled);

        if request.is_admin() {
            return Ok(serde_json::json!({ "score": ADMIN_SCORE }));
        }

        let score = store.get_score(&Self::score_query(arguments))?;
        Ok(serde_json::json!({ "score": score }))
    }
}

/// `clients_interests`: looks up interests for each requested client.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientsInterestsHandler;

impl MethodHandler for ClientsInterestsHandler {
    fn method(&self) -> Method {
        Method::ClientsInterests
    }

    fn schema(&self) -> &'static Schema {
        &schema::CLIENTS_INTERESTS_REQUEST
    }

    fn handle(
        &self,
        request: &MethodRequest,
        ctx: &mut RequestContext,
        store: &dyn Store,
    ) -> ApiResult<Value> {
        let arguments = &request.arguments;
        validate_arguments(self.schema(), arguments)?;

        let Some(Value::Array(client_ids)) = arguments.get("client_ids") else {
            return Err(ApiError::invalid_request(
                "Field client_ids should be a list",
            ));
        };

        let mut interests = Map::with_capacity(client_ids.len());
        for client_id in client_ids {
            let key = value_text(client_id).unwrap_or_else(|| "null".to_string());
            let values = store.get_interests(&key)?;
            interests.insert(key, Value::from(values));
        }

        ctx.set_nclients(client_ids.len());
        Ok(Value::Object(interests))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};
    use parking_lot::Mutex;
    use serde_json::json;

    /// Records every call and returns fixed values.
    #[derive(Default)]
    struct RecordingStore {
        score_calls: Mutex<Vec<ScoreQuery>>,
        interest_calls: Mutex<Vec<String>>,
    }

    impl Store for RecordingStore {
        fn get_score(&self, query: &ScoreQuery) -> Result<f64, StoreError> {
            self.score_calls.lock().push(query.clone());
            Ok(3.0)
        }

        fn get_interests(&self, client_id: &str) -> Result<Vec<String>, StoreError> {
            self.interest_calls.lock().push(client_id.to_string());
            Ok(vec![format!("interest-{client_id}")])
        }
    }

    struct FailingStore;

    impl Store for FailingStore {
        fn get_score(&self, _query: &ScoreQuery) -> Result<f64, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        fn get_interests(&self, _client_id: &str) -> Result<Vec<String>, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }
    }

    fn request(login: &str, arguments: Value) -> MethodRequest {
        MethodRequest {
            account: Some("horns&hoofs".into()),
            login: login.into(),
            arguments: arguments.as_object().cloned().unwrap_or_default(),
            ..MethodRequest::default()
        }
    }

    #[test]
    fn test_online_score_email_and_phone() {
        let store = RecordingStore::default();
        let mut ctx = RequestContext::new();
        let req = request("h&f", json!({"email": "a@b.c", "phone": "79999999999"}));

        let response = OnlineScoreHandler.handle(&req, &mut ctx, &store).unwrap();
        assert_eq!(response, json!({"score": 3.0}));
        assert_eq!(ctx.has().unwrap(), ["email", "phone"]);

        let calls = store.score_calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].email.as_deref(), Some("a@b.c"));
        assert_eq!(calls[0].phone.as_deref(), Some("79999999999"));
        assert_eq!(calls[0].gender, None);
    }

    #[test]
    fn test_online_score_numeric_arguments_become_text() {
        let store = RecordingStore::default();
        let mut ctx = RequestContext::new();
        let req = request("h&f", json!({"gender": 1, "birthday": "01.01.2000", "phone": 0}));

        OnlineScoreHandler.handle(&req, &mut ctx, &store).unwrap();

        let calls = store.score_calls.lock();
        assert_eq!(calls[0].gender.as_deref(), Some("1"));
        assert_eq!(calls[0].phone, None);
        assert_eq!(ctx.has().unwrap(), ["birthday", "gender"]);
    }

    #[test]
    fn test_online_score_empty_arguments_skip_store() {
        let store = RecordingStore::default();
        let mut ctx = RequestContext::new();

        let err = OnlineScoreHandler
            .handle(&request("h&f", json!({})), &mut ctx, &store)
            .unwrap_err();

        assert_eq!(err.to_envelope()["error"], INSUFFICIENT_PARAMETERS);
        assert_eq!(err.to_envelope()["code"], 422);
        assert!(store.score_calls.lock().is_empty());
        assert_eq!(ctx.has(), None);
    }

    #[test]
    fn test_online_score_unpaired_arguments_are_insufficient() {
        for arguments in [
            json!({"email": "a@b.c", "first_name": "a"}),
            json!({"phone": "7", "gender": 1}),
            json!({"first_name": "a", "last_name": ""}),
            json!({"gender": 0, "birthday": "01.01.2000"}),
        ] {
            assert!(!OnlineScoreHandler::has_enough_information(
                arguments.as_object().unwrap()
            ));
        }
    }

    #[test]
    fn test_online_score_admin_bypasses_store() {
        let store = RecordingStore::default();
        let mut ctx = RequestContext::new();
        let req = request("admin", json!({"first_name": "a", "last_name": "b"}));

        let response = OnlineScoreHandler.handle(&req, &mut ctx, &store).unwrap();
        assert_eq!(response, json!({"score": 42}));
        assert!(store.score_calls.lock().is_empty());
        assert_eq!(ctx.has().unwrap(), ["first_name", "last_name"]);
    }

    #[test]
    fn test_online_score_store_failure_is_internal() {
        let mut ctx = RequestContext::new();
        let req = request("h&f", json!({"email": "a@b.c", "phone": "7"}));

        let err = OnlineScoreHandler
            .handle(&req, &mut ctx, &FailingStore)
            .unwrap_err();
        assert_eq!(err.status_code(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_clients_interests_string_ids() {
        let store = MemoryStore::with_interests([
            ("1", vec!["books".to_string()]),
            ("2", vec!["tv".to_string()]),
        ]);
        let mut ctx = RequestContext::new();
        let req = request("h&f", json!({"client_ids": ["1", "2"]}));

        let response = ClientsInterestsHandler.handle(&req, &mut ctx, &store).unwrap();
        assert_eq!(response, json!({"1": ["books"], "2": ["tv"]}));
        assert_eq!(ctx.nclients(), Some(2));
    }

    #[test]
    fn test_clients_interests_numeric_ids_and_duplicates() {
        let store = RecordingStore::default();
        let mut ctx = RequestContext::new();
        let req = request("h&f", json!({"client_ids": [1, 2, 1], "date": "19.07.2017"}));

        let response = ClientsInterestsHandler.handle(&req, &mut ctx, &store).unwrap();
        assert_eq!(
            response,
            json!({"1": ["interest-1"], "2": ["interest-2"]})
        );
        assert_eq!(*store.interest_calls.lock(), ["1", "2", "1"]);
        assert_eq!(ctx.nclients(), Some(3));
    }

    #[test]
    fn test_clients_interests_missing_ids() {
        let store = RecordingStore::default();
        let mut ctx = RequestContext::new();

        let err = ClientsInterestsHandler
            .handle(&request("h&f", json!({"date": "19.07.2017"})), &mut ctx, &store)
            .unwrap_err();
        assert_eq!(err.to_envelope()["error"], "Field client_ids should be exists");
        assert_eq!(ctx.nclients(), None);
    }

    #[test]
    fn test_clients_interests_ids_not_a_list() {
        let store = RecordingStore::default();
        let mut ctx = RequestContext::new();

        let err = ClientsInterestsHandler
            .handle(&request("h&f", json!({"client_ids": "1,2"})), &mut ctx, &store)
            .unwrap_err();
        assert_eq!(err.to_envelope()["error"], "Field client_ids should be a list");
        assert!(store.interest_calls.lock().is_empty());
    }

    #[test]
    fn test_clients_interests_empty_list() {
        let store = RecordingStore::default();
        let mut ctx = RequestContext::new();

        let response = ClientsInterestsHandler
            .handle(&request("h&f", json!({"client_ids": []})), &mut ctx, &store)
            .unwrap();
        assert_eq!(response, json!({}));
        assert_eq!(ctx.nclients(), Some(0));
    }
}
