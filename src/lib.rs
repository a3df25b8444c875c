//! A minimal HTTP/1.1 server core.
//!
//! Each accepted connection serves exactly one request: the headers are read
//! in a single bounded read and parsed, a declared body is read under a size
//! limit and a minimum transfer speed, the request is routed to the first
//! matching route, and the handler's response is written before the
//! connection is closed.
//!
//! # Features
//!
//! - Byte-level request parsing with a fixed set of recognized header fields
//! - Route templates with named parameters (`/users/:id`), matched in
//!   registration order
//! - Connection deadlines, per-chunk read timeouts and slow-upload detection
//! - Not-found and error handlers
//! - JSON request and response bodies
//!
//! # Examples
//!
//! ## Parsing a request
//!
//! ```
//! use mate_rs::{parse_request, HeaderField};
//!
//! let request_bytes = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nX-Trace: 1\r\n\r\n";
//!
//! let request = parse_request(request_bytes).unwrap();
//! assert_eq!(request.method, "GET");
//! assert_eq!(request.path, "/index.html");
//! assert_eq!(request.header(HeaderField::Host), Some("example.com"));
//! // Unrecognized fields are dropped
//! assert_eq!(request.headers.len(), 1);
//! ```
//!
//! ## Running a server
//!
//! ```no_run
//! use mate_rs::{HttpServer, ServerConfig, PartialConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mate_rs::ServerError> {
//!     let config = ServerConfig::from(PartialConfig {
//!         logging_enabled: Some(true),
//!         ..Default::default()
//!     });
//!
//!     let mut server = HttpServer::new(config);
//!     server
//!         .get("/", |ctx| ctx.send_string("Test String"))?
//!         .get("/users/:id", |ctx| {
//!             let id = ctx.param("id")?.to_string();
//!             ctx.json(&serde_json::json!({ "id": id }))
//!         })?;
//!     server.set_not_found(|ctx| ctx.status(404).html("<h1>Not Found</h1>"));
//!     server.set_error(|ctx, _err| ctx.status(500).json(&serde_json::json!({ "success": false })));
//!
//!     server.listen("127.0.0.1:3000").await
//! }
//! ```

// Export the parser module
pub mod parser;

// Export the server module
pub mod server;

// Re-export commonly used items for convenience
pub use parser::{Error as ParserError, HeaderField, HttpRequest, Method, parse_request};
pub use server::{
    Context, Error as ServerError, HttpResponse, HttpServer, PartialConfig, ServerConfig, StatusCode,
};
