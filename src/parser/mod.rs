//! HTTP request parser.
//!
//! Turns the raw bytes of a single header read into an [`HttpRequest`]. Only a
//! fixed set of header fields is recognized; see [`HeaderField`].

mod request;
mod method;
mod header;
mod error;

// Re-export public items
pub use request::{HttpRequest, HEADER_BUFFER_SIZE};
pub use method::Method;
pub use header::HeaderField;
pub use error::Error;

// Re-export the parse_request function
pub use request::parse_request;
