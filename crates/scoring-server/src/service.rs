//! The request pipeline.
//!
//! [`MethodService`] turns one HTTP request (method, path, `Content-Length`
//! and body bytes) into a status code and a JSON envelope. It has no
//! transport dependency, so the hyper loop and unit tests drive the same code.
//!
//! Processing order:
//!
//! 1. anything but `POST` is 405
//! 2. a missing or unparsable `Content-Length`, a short body, invalid JSON or
//!    a non-object payload is 400
//! 3. envelope validation failures are 422 with every message
//! 4. an unknown path is 404
//! 5. a token mismatch is 403 (when auth is enforced)
//! 6. the dispatcher answers; handler faults are 500

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use http::StatusCode;
use serde_json::{json, Map, Value};

use scoring_core::{
    check_auth_at, schema, validate, ApiError, ApiResult, DispatchError, Dispatcher,
    ErrorCategory, MethodRequest, RequestContext, RequestId, Store,
};
use scoring_telemetry::{log_request_complete, log_request_error, log_request_start};

use crate::router::{Route, Router};

/// Source of "now" for hour-based admin tokens.
pub type Clock = fn() -> DateTime<Local>;

/// Outcome of one request.
#[derive(Debug)]
pub struct ApiResponse {
    /// HTTP status, mirrored in the body's `code`.
    pub status: StatusCode,
    /// `{"response": ..., "code": 200}` or `{"error": ..., "code": ...}`.
    pub body: Value,
    /// Context recorded while handling.
    pub context: RequestContext,
}

impl ApiResponse {
    /// Serializes the body.
    #[must_use]
    pub fn body_string(&self) -> String {
        self.body.to_string()
    }
}

/// Validates, authenticates and dispatches API requests.
#[derive(Clone)]
pub struct MethodService {
    router: Router,
    dispatcher: Arc<Dispatcher>,
    store: Arc<dyn Store>,
    enforce_auth: bool,
    clock: Clock,
}

impl MethodService {
    /// Creates a service with the built-in handlers.
    pub fn new(store: Arc<dyn Store>) -> Result<Self, DispatchError> {
        Ok(Self::with_dispatcher(Dispatcher::new()?, store))
    }

    /// Creates a service with a custom dispatcher.
    #[must_use]
    pub fn with_dispatcher(dispatcher: Dispatcher, store: Arc<dyn Store>) -> Self {
        Self {
            router: Router::new(),
            dispatcher: Arc::new(dispatcher),
            store,
            enforce_auth: true,
            clock: Local::now,
        }
    }

    /// Enables or disables token checks.
    #[must_use]
    pub fn enforce_auth(mut self, enforce: bool) -> Self {
        self.enforce_auth = enforce;
        self
    }

    /// Replaces the clock used for admin tokens.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Returns whether token checks are enabled.
    #[must_use]
    pub fn is_auth_enforced(&self) -> bool {
        self.enforce_auth
    }

    /// Handles one request and logs its start and completion.
    pub fn handle(
        &self,
        http_method: &http::Method,
        path: &str,
        content_length: Option<&str>,
        body: &[u8],
        request_id: RequestId,
    ) -> ApiResponse {
        let mut ctx = RequestContext::with_request_id(request_id);
        log_request_start!(
            ctx.request_id(),
            http_method,
            path,
            body = String::from_utf8_lossy(body)
        );

        let (status, body) = match self.process(http_method, path, content_length, body, &mut ctx)
        {
            Ok(response) => (
                StatusCode::OK,
                json!({"response": response, "code": StatusCode::OK.as_u16()}),
            ),
            Err(err) => {
                if err.category() == ErrorCategory::Internal {
                    log_request_error!(ctx.request_id(), error_chain(&err));
                } else {
                    tracing::debug!(request_id = %ctx.request_id(), error = %err, "Request rejected");
                }
                (err.status_code(), err.to_envelope())
            }
        };

        let duration_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX);
        log_request_complete!(
            ctx.request_id(),
            status.as_u16(),
            duration_ms,
            nclients = ctx.nclients(),
            has = ctx.has(),
            response = body
        );

        ApiResponse {
            status,
            body,
            context: ctx,
        }
    }

    fn process(
        &self,
        http_method: &http::Method,
        path: &str,
        content_length: Option<&str>,
        body: &[u8],
        ctx: &mut RequestContext,
    ) -> ApiResult<Value> {
        if http_method != http::Method::POST {
            return Err(ApiError::method_not_allowed(format!("{http_method} {path}")));
        }

        let data = read_object(content_length, body)?;

        let envelope = validate(&schema::METHOD_REQUEST, &data);
        if !envelope.is_valid() {
            return Err(ApiError::invalid_request(envelope.messages()));
        }

        let Some(Route::Method) = self.router.match_path(path) else {
            return Err(ApiError::not_found(format!("no route for '{path}'")));
        };

        let request = MethodRequest::from_object(&data);
        if self.enforce_auth && !check_auth_at(&request, &(self.clock)()) {
            return Err(ApiError::forbidden(format!(
                "token mismatch for login '{}'",
                request.login
            )));
        }

        self.dispatcher.dispatch(&request, ctx, self.store.as_ref())
    }
}

impl fmt::Debug for MethodService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodService")
            .field("router", &self.router)
            .field("dispatcher", &self.dispatcher)
            .field("enforce_auth", &self.enforce_auth)
            .finish_non_exhaustive()
    }
}

/// Reads exactly `Content-Length` bytes of `body` as a JSON object.
fn read_object(content_length: Option<&str>, body: &[u8]) -> ApiResult<Map<String, Value>> {
    let declared = content_length.ok_or_else(|| ApiError::bad_request("missing Content-Length"))?;
    let length: usize = declared
        .trim()
        .parse()
        .map_err(|e| ApiError::bad_request(format!("invalid Content-Length '{declared}': {e}")))?;

    let payload = body.get(..length).ok_or_else(|| {
        ApiError::bad_request(format!(
            "body has {} bytes, Content-Length is {length}",
            body.len()
        ))
    })?;

    match serde_json::from_slice(payload) {
        Ok(Value::Object(data)) => Ok(data),
        Ok(_) => Err(ApiError::bad_request("body is not a JSON object")),
        Err(e) => Err(ApiError::bad_request(format!("invalid JSON: {e}"))),
    }
}

/// Formats an error with all of its sources.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use scoring_core::auth::{admin_token, user_token};
    use scoring_core::{MemoryStore, ScoreQuery, StoreError};

    struct FailingStore;

    impl Store for FailingStore {
        fn get_score(&self, _query: &ScoreQuery) -> Result<f64, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        fn get_interests(&self, _client_id: &str) -> Result<Vec<String>, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }
    }

    fn fixed_clock() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 1, 14, 30, 0)
            .single()
            .expect("unambiguous local time")
    }

    fn service() -> MethodService {
        let store = MemoryStore::with_interests([
            ("1", vec!["books".to_string()]),
            ("2", vec!["tv".to_string()]),
        ]);
        MethodService::new(Arc::new(store))
            .unwrap()
            .with_clock(fixed_clock)
    }

    fn user_envelope(method: &str, arguments: Value) -> Value {
        json!({
            "account": "horns&hoofs",
            "login": "h&f",
            "token": user_token(Some("horns&hoofs"), "h&f"),
            "method": method,
            "arguments": arguments,
        })
    }

    fn post(service: &MethodService, path: &str, body: &Value) -> ApiResponse {
        let bytes = body.to_string().into_bytes();
        let length = bytes.len().to_string();
        service.handle(
            &http::Method::POST,
            path,
            Some(&length),
            &bytes,
            RequestId::from_header("test-request"),
        )
    }

    #[test]
    fn test_online_score_ok() {
        let response = post(
            &service(),
            "/method/",
            &user_envelope("online_score", json!({"phone": "79175002040", "email": "a@b.c"})),
        );

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({"response": {"score": 3.0}, "code": 200}));
        assert_eq!(
            response.context.has(),
            Some(&["email".to_string(), "phone".to_string()][..])
        );
    }

    #[test]
    fn test_admin_score_uses_clock() {
        let envelope = json!({
            "login": "admin",
            "token": admin_token(&fixed_clock()),
            "method": "online_score",
            "arguments": {"first_name": "a", "last_name": "b"},
        });

        let response = post(&service(), "/method", &envelope);
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["response"], json!({"score": 42}));
    }

    #[test]
    fn test_clients_interests_ok() {
        let response = post(
            &service(),
            "/method",
            &user_envelope("clients_interests", json!({"client_ids": [1, 2]})),
        );

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.body["response"],
            json!({"1": ["books"], "2": ["tv"]})
        );
        assert_eq!(response.context.nclients(), Some(2));
        assert_eq!(response.context.request_id().as_str(), "test-request");
    }

    #[test]
    fn test_non_post_is_method_not_allowed() {
        let response = service().handle(
            &http::Method::GET,
            "/method",
            None,
            b"",
            RequestId::new(),
        );
        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.body["code"], 405);
    }

    #[test]
    fn test_content_length_problems_are_bad_request() {
        let body = br#"{"login": "h&f"}"#;
        let service = service();

        for length in [None, Some("abc"), Some("-1"), Some("1000")] {
            let response =
                service.handle(&http::Method::POST, "/method", length, body, RequestId::new());
            assert_eq!(response.status, StatusCode::BAD_REQUEST, "{length:?}");
            assert_eq!(
                response.body,
                json!({"error": "Bad Request", "code": 400})
            );
        }
    }

    #[test]
    fn test_only_content_length_bytes_are_read() {
        let envelope = user_envelope("clients_interests", json!({"client_ids": [1]})).to_string();
        let length = envelope.len().to_string();
        let mut body = envelope.into_bytes();
        body.extend_from_slice(b"trailing garbage");

        let response = service().handle(
            &http::Method::POST,
            "/method",
            Some(&length),
            &body,
            RequestId::new(),
        );
        assert_eq!(response.status, StatusCode::OK);
    }

    #[test]
    fn test_malformed_json_is_bad_request() {
        let service = service();
        for body in [&b"{not json"[..], b"[1, 2]", b"\"text\"", b""] {
            let length = body.len().to_string();
            let response =
                service.handle(&http::Method::POST, "/method", Some(&length), body, RequestId::new());
            assert_eq!(response.status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_envelope_errors_are_listed() {
        let response = post(&service(), "/method", &json!({}));

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.body["error"],
            json!([
                "Field login should be exists",
                "Field token should be exists",
                "Field arguments should be exists",
                "Field method should be filled",
                "Field method should be exists",
            ])
        );
    }

    #[test]
    fn test_empty_method_is_invalid() {
        let mut envelope = user_envelope("online_score", json!({}));
        envelope["method"] = json!("");

        let response = post(&service(), "/method", &envelope);
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.body["error"], json!(["Field method should be filled"]));
    }

    #[test]
    fn test_envelope_checked_before_route() {
        let response = post(&service(), "/unknown", &json!({}));
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_unknown_route_is_not_found() {
        let response = post(
            &service(),
            "/score",
            &user_envelope("online_score", json!({"phone": "79175002040", "email": "a@b.c"})),
        );

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, json!({"error": "Not Found", "code": 404}));
    }

    #[test]
    fn test_unknown_method_is_not_found() {
        let response = post(&service(), "/method", &user_envelope("delete_all", json!({})));
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_bad_token_is_forbidden() {
        let mut envelope = user_envelope("online_score", json!({"phone": "79175002040", "email": "a@b.c"}));
        envelope["token"] = json!("sdd");

        let response = post(&service(), "/method", &envelope);
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.body, json!({"error": "Forbidden", "code": 403}));
    }

    #[test]
    fn test_stale_admin_token_is_forbidden() {
        let an_hour_earlier = fixed_clock() - chrono::Duration::hours(1);
        let envelope = json!({
            "login": "admin",
            "token": admin_token(&an_hour_earlier),
            "method": "online_score",
            "arguments": {"phone": "79175002040", "email": "a@b.c"},
        });

        let response = post(&service(), "/method", &envelope);
        assert_eq!(response.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_auth_can_be_disabled() {
        let mut envelope = user_envelope("clients_interests", json!({"client_ids": [2]}));
        envelope["token"] = json!("");

        let service = service().enforce_auth(false);
        assert!(!service.is_auth_enforced());

        let response = post(&service, "/method", &envelope);
        assert_eq!(response.status, StatusCode::OK);
    }

    #[test]
    fn test_argument_errors_report_first_message() {
        let response = post(
            &service(),
            "/method",
            &user_envelope("clients_interests", json!({"date": "20.07.2017"})),
        );

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.body["error"], "Field client_ids should be exists");
    }

    #[test]
    fn test_store_failure_is_generic_internal_error() {
        let service = MethodService::new(Arc::new(FailingStore))
            .unwrap()
            .with_clock(fixed_clock);

        let response = post(
            &service,
            "/method",
            &user_envelope("clients_interests", json!({"client_ids": [1]})),
        );
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.body,
            json!({"error": "Internal Server Error", "code": 500})
        );
    }

    #[test]
    fn test_request_and_response_are_logged() {
        #[derive(Clone, Default)]
        struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

        impl std::io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let envelope = user_envelope("clients_interests", json!({"client_ids": [2]}));
        tracing::subscriber::with_default(subscriber, || {
            post(&service(), "/method", &envelope);
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains(r#""method":"clients_interests""#));
        assert!(output.contains(r#"response={"code":200,"response":{"2":["tv"]}}"#));
        assert!(output.contains("nclients=Some(1)"));
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let err = ApiError::from(StoreError::unavailable("connection refused"));
        let chain = error_chain(&err);
        assert!(chain.starts_with("Internal error: store lookup failed"));
        assert!(chain.contains("connection refused"));
    }
}
