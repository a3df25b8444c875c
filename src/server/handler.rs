//! Request handlers and routes.

use std::sync::Arc;

use crate::parser::Method;
use crate::server::context::Context;
use crate::server::error::Error;
use crate::server::pattern::PathPattern;

/// Type alias for a route or not-found handler.
///
/// Handlers fill in `ctx.res`; returning `Err` hands the context to the error
/// handler.
pub type HandlerFn = Arc<dyn Fn(&mut Context) -> Result<(), Error> + Send + Sync>;

/// Type alias for the error handler, called with the context of the failed
/// handler and its error.
pub type ErrorHandlerFn = Arc<dyn Fn(&mut Context, Error) -> Result<(), Error> + Send + Sync>;

/// Represents a route in the HTTP server.
pub struct Route {
    /// The method group the route belongs to.
    pub method: Method,
    /// The compiled path template.
    pub pattern: PathPattern,
    /// The handler function.
    pub handler: HandlerFn,
}
