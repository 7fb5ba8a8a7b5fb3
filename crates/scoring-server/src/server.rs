//! HTTP server implementation.
//!
//! A tokio accept loop hands every connection to hyper's HTTP/1 connection
//! driver. Each request body is collected (bounded by size and time) and
//! passed to [`MethodService::handle`] on the blocking pool.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scoring_core::MemoryStore;
//! use scoring_server::{MethodService, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = MethodService::new(Arc::new(MemoryStore::new()))?;
//!     let config = ServerConfig::builder().http_addr("127.0.0.1:8080").build();
//!
//!     Server::new(config, service).run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use scoring_core::{ApiError, RequestId};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::service::{ApiResponse, MethodService};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Header carrying the request ID, echoed on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the configured address.
    #[error("bind error: {0}")]
    BindError(String),

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The scoring API HTTP server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    service: MethodService,
}

impl Server {
    /// Creates a server.
    ///
    /// The auth setting of `config` is applied to `service`.
    #[must_use]
    pub fn new(config: ServerConfig, service: MethodService) -> Self {
        let service = service.enforce_auth(config.enforce_auth());
        Self { config, service }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the request pipeline.
    #[must_use]
    pub fn service(&self) -> &MethodService {
        &self.service
    }

    /// Runs the server until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and runs until `shutdown` triggers.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.config.socket_addr().map_err(|e| {
            ServerError::BindError(format!("invalid address '{}': {e}", self.config.http_addr()))
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(format!("failed to bind to {addr}: {e}")))?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener.
    ///
    /// After `shutdown` triggers, waits up to the configured shutdown timeout
    /// for open connections to finish.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, auth = self.service.is_auth_enforced(), "Server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, remote_addr, shutdown).await {
                                    tracing::debug!(remote = %remote_addr, error = %e, "Connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }
        drop(listener);

        let shutdown_timeout = server.config.shutdown_timeout();
        tracing::info!(
            "Waiting up to {:?} for {} connections to close",
            shutdown_timeout,
            tracker.active_connections()
        );

        tokio::select! {
            () = tracker.wait_for_shutdown() => {
                tracing::info!("All connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    "Shutdown timeout reached, {} connections still active",
                    tracker.active_connections()
                );
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { server.handle_request(req).await }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                tracing::debug!(remote = %remote_addr, "Closing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_request(
        self: &Arc<Self>,
        req: Request<Incoming>,
    ) -> Result<HttpResponse, Infallible> {
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map_or_else(RequestId::new, RequestId::from_header);

        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let content_length = req
            .headers()
            .get(CONTENT_LENGTH)
            .map(|value| value.to_str().unwrap_or_default().to_string());

        let limit = self.config.max_body_bytes();
        let collected = tokio::time::timeout(
            self.config.request_timeout(),
            Limited::new(req.into_body(), limit).collect(),
        )
        .await;

        let body = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                tracing::warn!(request_id = %request_id, error = %e, limit, "Failed to read request body");
                return Ok(error_response(&ApiError::bad_request(e.to_string()), &request_id));
            }
            Err(_) => {
                tracing::warn!(request_id = %request_id, "Request body collection timed out");
                return Ok(error_response(
                    &ApiError::bad_request("body read timed out"),
                    &request_id,
                ));
            }
        };

        let server = Arc::clone(self);
        let task_id = request_id.clone();
        let handled = tokio::time::timeout(
            self.config.request_timeout(),
            tokio::task::spawn_blocking(move || {
                server
                    .service
                    .handle(&method, &path, content_length.as_deref(), &body, task_id)
            }),
        )
        .await;

        let response = match handled {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::error!(request_id = %request_id, error = %e, "Request task failed");
                return Ok(error_response(
                    &ApiError::internal(e.to_string()),
                    &request_id,
                ));
            }
            Err(_) => {
                tracing::error!(request_id = %request_id, "Request processing timed out");
                return Ok(error_response(
                    &ApiError::internal("request processing timed out"),
                    &request_id,
                ));
            }
        };

        Ok(to_http_response(&response))
    }
}

fn to_http_response(response: &ApiResponse) -> HttpResponse {
    json_response(
        response.status,
        response.body_string(),
        response.context.request_id(),
    )
}

fn error_response(err: &ApiError, request_id: &RequestId) -> HttpResponse {
    json_response(err.status_code(), err.to_envelope().to_string(), request_id)
}

fn json_response(status: StatusCode, body: String, request_id: &RequestId) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    response
}
