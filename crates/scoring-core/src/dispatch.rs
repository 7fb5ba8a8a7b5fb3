//! Method dispatch.
//!
//! The [`Dispatcher`] maps every [`Method`] to exactly one [`MethodHandler`].
//! Completeness is checked once, when the dispatcher is built.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;
use thiserror::Error;

use crate::context::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::handler::{ClientsInterestsHandler, MethodHandler, OnlineScoreHandler};
use crate::request::{Method, MethodRequest};
use crate::store::Store;

/// Errors raised while building a [`Dispatcher`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// A method has no handler.
    #[error("no handler registered for method '{0}'")]
    MissingHandler(Method),

    /// A method has more than one handler.
    #[error("duplicate handler for method '{0}'")]
    DuplicateHandler(Method),
}

/// Builder for [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    handlers: Vec<Box<dyn MethodHandler>>,
}

impl DispatcherBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler.
    #[must_use]
    pub fn handler(mut self, handler: impl MethodHandler) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Builds the dispatcher, checking that every method has one handler.
    pub fn build(self) -> Result<Dispatcher, DispatchError> {
        let mut handlers: HashMap<Method, Box<dyn MethodHandler>> = HashMap::new();
        for handler in self.handlers {
            let method = handler.method();
            if handlers.insert(method, handler).is_some() {
                return Err(DispatchError::DuplicateHandler(method));
            }
        }

        if let Some(missing) = Method::ALL.into_iter().find(|m| !handlers.contains_key(m)) {
            return Err(DispatchError::MissingHandler(missing));
        }

        Ok(Dispatcher { handlers })
    }
}

/// Routes a validated request to its method handler.
///
/// # Example
///
/// ```
/// use scoring_core::{Dispatcher, MemoryStore, MethodRequest, RequestContext};
/// use serde_json::json;
///
/// let dispatcher = Dispatcher::new().unwrap();
/// let request = MethodRequest {
///     login: "admin".into(),
///     method: "online_score".into(),
///     arguments: json!({"phone": "7", "email": "a@b.c"}).as_object().unwrap().clone(),
///     ..MethodRequest::default()
/// };
///
/// let mut ctx = RequestContext::new();
/// let response = dispatcher.dispatch(&request, &mut ctx, &MemoryStore::new()).unwrap();
/// assert_eq!(response, json!({"score": 42}));
/// ```
pub struct Dispatcher {
    handlers: HashMap<Method, Box<dyn MethodHandler>>,
}

impl Dispatcher {
    /// Creates a dispatcher with the built-in handlers.
    pub fn new() -> Result<Self, DispatchError> {
        Self::builder()
            .handler(OnlineScoreHandler)
            .handler(ClientsInterestsHandler)
            .build()
    }

    /// Returns a builder for custom handler sets.
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Returns the handler of `method`.
    #[must_use]
    pub fn handler(&self, method: Method) -> Option<&dyn MethodHandler> {
        self.handlers.get(&method).map(|handler| &**handler)
    }

    /// Dispatches `request` to the handler named by `request.method`.
    ///
    /// An unknown method name is [`ApiError::NotFound`]. A panic inside the
    /// handler is caught and reported as [`ApiError::Internal`].
    pub fn dispatch(
        &self,
        request: &MethodRequest,
        ctx: &mut RequestContext,
        store: &dyn Store,
    ) -> ApiResult<Value> {
        let method: Method = request
            .method
            .parse()
            .map_err(|err| ApiError::not_found(format!("{err}")))?;

        let handler = self
            .handler(method)
            .ok_or_else(|| ApiError::not_found(format!("no handler for '{method}'")))?;

        tracing::debug!(method = %method, request_id = %ctx.request_id(), "Dispatching request");

        catch_unwind(AssertUnwindSafe(|| handler.handle(request, ctx, store))).unwrap_or_else(
            |panic| {
                Err(ApiError::internal(format!(
                    "handler '{method}' panicked: {}",
                    panic_message(&*panic)
                )))
            },
        )
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut methods: Vec<_> = self.handlers.keys().map(Method::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("Dispatcher").field("methods", &methods).finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::schema::{self, Schema};
    use crate::store::MemoryStore;
    use serde_json::json;

    struct PanickingHandler;

    impl MethodHandler for PanickingHandler {
        fn method(&self) -> Method {
            Method::ClientsInterests
        }

        fn schema(&self) -> &'static Schema {
            &schema::CLIENTS_INTERESTS_REQUEST
        }

        fn handle(
            &self,
            _request: &MethodRequest,
            _ctx: &mut RequestContext,
            _store: &dyn Store,
        ) -> ApiResult<Value> {
            panic!("index out of bounds")
        }
    }

    fn request(method: &str, arguments: Value) -> MethodRequest {
        MethodRequest {
            login: "h&f".into(),
            method: method.into(),
            arguments: arguments.as_object().cloned().unwrap_or_default(),
            ..MethodRequest::default()
        }
    }

    #[test]
    fn test_default_dispatcher_is_complete() {
        let dispatcher = Dispatcher::new().unwrap();
        for method in Method::ALL {
            assert_eq!(dispatcher.handler(method).unwrap().method(), method);
        }
    }

    #[test]
    fn test_missing_handler_rejected() {
        let err = Dispatcher::builder()
            .handler(OnlineScoreHandler)
            .build()
            .unwrap_err();
        assert_eq!(err, DispatchError::MissingHandler(Method::ClientsInterests));
    }

    #[test]
    fn test_duplicate_handler_rejected() {
        let err = Dispatcher::builder()
            .handler(OnlineScoreHandler)
            .handler(OnlineScoreHandler)
            .handler(ClientsInterestsHandler)
            .build()
            .unwrap_err();
        assert_eq!(err, DispatchError::DuplicateHandler(Method::OnlineScore));
    }

    #[test]
    fn test_unknown_method_is_not_found() {
        let dispatcher = Dispatcher::new().unwrap();
        let mut ctx = RequestContext::new();

        let err = dispatcher
            .dispatch(&request("get_everything", json!({})), &mut ctx, &MemoryStore::new())
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.to_envelope()["error"], "Not Found");
    }

    #[test]
    fn test_dispatch_clients_interests() {
        let dispatcher = Dispatcher::new().unwrap();
        let store = MemoryStore::with_interests([("5", vec!["music".to_string()])]);
        let mut ctx = RequestContext::new();

        let response = dispatcher
            .dispatch(
                &request("clients_interests", json!({"client_ids": [5, 6]})),
                &mut ctx,
                &store,
            )
            .unwrap();
        assert_eq!(response, json!({"5": ["music"], "6": []}));
        assert_eq!(ctx.nclients(), Some(2));
    }

    #[test]
    fn test_handler_panic_is_internal() {
        let dispatcher = Dispatcher::builder()
            .handler(OnlineScoreHandler)
            .handler(PanickingHandler)
            .build()
            .unwrap();
        let mut ctx = RequestContext::new();

        let err = dispatcher
            .dispatch(
                &request("clients_interests", json!({"client_ids": [1]})),
                &mut ctx,
                &MemoryStore::new(),
            )
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert!(err.to_string().contains("index out of bounds"));
        assert_eq!(err.to_envelope()["error"], "Internal Server Error");
    }

    #[test]
    fn test_debug_lists_methods() {
        let dispatcher = Dispatcher::new().unwrap();
        assert_eq!(
            format!("{dispatcher:?}"),
            r#"Dispatcher { methods: ["clients_interests", "online_score"] }"#
        );
    }
}
