//! The route table.
//!
//! Routes are grouped by method and kept in registration order. Lookup walks
//! the group front to back and takes the first structural match, so a general
//! pattern registered early shadows a more specific one registered later.

use std::collections::HashMap;
use std::str::FromStr;

use log::debug;

use crate::parser::Method;
use crate::server::error::Error;
use crate::server::handler::{ErrorHandlerFn, HandlerFn, Route};
use crate::server::pattern::PathPattern;

/// A successful lookup.
pub struct RouteMatch<'a> {
    /// The first route whose template matched.
    pub route: &'a Route,
    /// Parameters captured from the path.
    pub params: HashMap<String, String>,
}

/// Route table plus the not-found and error handlers.
#[derive(Default)]
pub struct Router {
    get: Vec<Route>,
    post: Vec<Route>,
    put: Vec<Route>,
    delete: Vec<Route>,
    not_found: Option<HandlerFn>,
    error_handler: Option<ErrorHandlerFn>,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `template` and append a route to the `method` group.
    pub fn add(&mut self, method: Method, template: &str, handler: HandlerFn) -> Result<(), Error> {
        let pattern = PathPattern::compile(template)?;
        debug!("Registered route {method} {template}");
        self.routes_mut(method).push(Route {
            method,
            pattern,
            handler,
        });
        Ok(())
    }

    /// Set the handler used when no route matches.
    pub fn set_not_found(&mut self, handler: HandlerFn) {
        self.not_found = Some(handler);
    }

    /// Set the handler that receives every handler failure.
    pub fn set_error(&mut self, handler: ErrorHandlerFn) {
        self.error_handler = Some(handler);
    }

    /// The routes registered under `method`, in registration order.
    pub fn routes(&self, method: Method) -> &[Route] {
        match method {
            Method::GET => &self.get,
            Method::POST => &self.post,
            Method::PUT => &self.put,
            Method::DELETE => &self.delete,
        }
    }

    fn routes_mut(&mut self, method: Method) -> &mut Vec<Route> {
        match method {
            Method::GET => &mut self.get,
            Method::POST => &mut self.post,
            Method::PUT => &mut self.put,
            Method::DELETE => &mut self.delete,
        }
    }

    /// Every route, grouped by method.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        Method::ALL.into_iter().flat_map(move |method| self.routes(method))
    }

    /// Find the first route in the `method` group matching `path`.
    ///
    /// `method` is the raw request method; anything outside the four route
    /// groups never matches.
    pub fn resolve(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        let method = Method::from_str(method).ok()?;
        self.routes(method).iter().find_map(|route| {
            route
                .pattern
                .extract(path)
                .map(|params| RouteMatch { route, params })
        })
    }

    /// The not-found handler, if one was set.
    pub fn not_found_handler(&self) -> Option<&HandlerFn> {
        self.not_found.as_ref()
    }

    /// The error handler, if one was set.
    pub fn error_handler(&self) -> Option<&ErrorHandlerFn> {
        self.error_handler.as_ref()
    }

    /// Check the router is complete enough to serve.
    ///
    /// # Errors
    ///
    /// [`Error::MissingErrorHandler`] when no error handler is set.
    pub fn validate(&self) -> Result<(), Error> {
        if self.error_handler.is_none() {
            return Err(Error::MissingErrorHandler);
        }
        Ok(())
    }
}
