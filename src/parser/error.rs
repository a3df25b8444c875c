//! Error types for the HTTP parser.

use thiserror::Error;

/// Errors that can occur during HTTP request parsing.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP method is not one the router groups routes by.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// The request line is malformed (wrong format or missing components).
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// The buffer ended before the request line was terminated.
    #[error("Incomplete request: no line terminator found")]
    IncompleteRequest,

    /// The header block did not end within one full header buffer.
    #[error("Request headers exceed {0} bytes")]
    HeadersTooLarge(usize),

    /// The request is empty.
    #[error("Empty request")]
    EmptyRequest,
}
