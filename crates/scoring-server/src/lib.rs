//! # Scoring Server
//!
//! HTTP front end of the scoring API.
//!
//! - [`MethodService`]: the transport-free request pipeline
//! - [`Server`]: tokio + hyper HTTP/1.1 server with graceful shutdown
//! - [`Router`]: path to endpoint mapping
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scoring_core::MemoryStore;
//! use scoring_server::{MethodService, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = MethodService::new(Arc::new(MemoryStore::new()))?;
//!     Server::new(ServerConfig::default(), service).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/scoring-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
mod router;
mod server;
mod service;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use router::{Route, Router};
pub use server::{HttpResponse, ResponseBody, Server, ServerError, REQUEST_ID_HEADER};
pub use service::{ApiResponse, Clock, MethodService};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownReceiver, ShutdownSignal};
