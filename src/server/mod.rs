//! HTTP server for mate-rs.
//!
//! The accept loop in [`HttpServer`] hands each connection to
//! [`handle_connection`], which parses the request, reads any body through the
//! throughput-limited [`read_body`], routes through the [`Router`] and writes
//! the handler's [`HttpResponse`].

mod response;
mod config;
mod context;
mod connection;
mod error;
mod handler;
mod http_server;
mod pattern;
mod router;
mod transfer;

// Re-export public items
pub use response::{HttpResponse, StatusCode};
pub use config::{PartialConfig, ServerConfig};
pub use context::Context;
pub use connection::handle_connection;
pub use error::{Error, TransferError};
pub use handler::{ErrorHandlerFn, HandlerFn, Route};
pub use http_server::HttpServer;
pub use pattern::PathPattern;
pub use router::{RouteMatch, Router};
pub use transfer::{read_body, CHUNK_READ_TIMEOUT, CHUNK_SIZE};
