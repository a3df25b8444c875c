//! Error types for the HTTP server.

use thiserror::Error;

use crate::parser::Error as ParserError;
use crate::server::response::StatusCode;

/// Errors that can occur during HTTP server operation.
///
/// Handlers return this type too, so application failures travel to the
/// registered error handler without conversion.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A connection deadline expired.
    #[error("Timed out while {0}")]
    Timeout(&'static str),

    /// The configured request timeout does not fit in a deadline.
    #[error("Cannot set a connection deadline {0}s in the future")]
    InvalidDeadline(u64),

    /// Reading the request body failed.
    #[error("Body transfer failed: {0}")]
    Transfer(#[from] TransferError),

    /// A route template could not be compiled.
    #[error("Invalid route template {template}: {reason}")]
    InvalidRoute { template: String, reason: String },

    /// A status code outside the supported table.
    #[error("Unsupported status code: {0}")]
    UnsupportedStatusCode(u16),

    /// The server was started without an error handler.
    #[error("No error handler registered; call set_error before listening")]
    MissingErrorHandler,

    /// A path parameter that the matched route does not declare.
    #[error("Path parameter {0} does not exist")]
    MissingParam(String),

    /// Application-level failure raised by a handler.
    #[error("Handler error: {0}")]
    Handler(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Ways reading a request body can fail.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The declared length is over the configured maximum.
    #[error("Content length {declared} exceeds maximum of {max} bytes")]
    TooLarge { declared: usize, max: usize },

    /// A single chunk read took longer than the per-chunk timeout.
    #[error("Timed out waiting for body data")]
    ReadTimeout,

    /// Sustained throughput fell under the configured minimum.
    #[error("Transfer speed too slow: {rate} bytes/s, minimum is {min} bytes/s")]
    TooSlow { rate: u64, min: u64 },

    /// The peer closed the connection before the full body arrived.
    #[error("Connection closed after {received} of {expected} body bytes")]
    ConnectionClosed { received: usize, expected: usize },

    /// I/O error.
    #[error("I/O error reading body: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    /// The response status this failure is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            TransferError::TooLarge { .. } => StatusCode::PayloadTooLarge,
            TransferError::TooSlow { .. } => StatusCode::RequestTimeout,
            TransferError::ReadTimeout
            | TransferError::ConnectionClosed { .. }
            | TransferError::Io(_) => StatusCode::InternalServerError,
        }
    }
}
