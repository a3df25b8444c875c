//! Per-request handler context.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::parser::HttpRequest;
use crate::server::error::Error;
use crate::server::response::HttpResponse;

/// Everything a handler sees and writes for one request.
///
/// A context belongs to the connection task that created it and is dropped
/// when the connection closes.
#[derive(Debug)]
pub struct Context {
    /// The parsed request.
    pub req: HttpRequest,
    /// The response being built.
    pub res: HttpResponse,
    params: HashMap<String, String>,
    started: Instant,
}

impl Context {
    /// Create a context for `req` with a `200 text/plain` empty response.
    pub fn new(req: HttpRequest) -> Self {
        Self {
            req,
            res: HttpResponse::default(),
            params: HashMap::new(),
            started: Instant::now(),
        }
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    /// The parsed request.
    pub fn request(&self) -> &HttpRequest {
        &self.req
    }

    /// The response as built so far.
    pub fn response(&self) -> &HttpResponse {
        &self.res
    }

    /// Time since the connection was accepted.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Set the response status code.
    pub fn status(&mut self, code: u16) -> &mut Self {
        self.res.status = code;
        self
    }

    /// Respond with a `text/plain` body.
    pub fn send_string(&mut self, body: impl Into<String>) -> Result<(), Error> {
        self.res.content_type = "text/plain".to_string();
        self.res.body = body.into();
        Ok(())
    }

    /// Respond with a `text/html` body.
    pub fn html(&mut self, body: impl Into<String>) -> Result<(), Error> {
        self.res.content_type = "text/html".to_string();
        self.res.body = body.into();
        Ok(())
    }

    /// Respond with `value` serialized as `application/json`.
    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<(), Error> {
        let body = serde_json::to_string(value)?;
        self.res.content_type = "application/json".to_string();
        self.res.body = body;
        Ok(())
    }

    /// A path parameter captured by the matched route.
    pub fn param(&self, name: &str) -> Result<&str, Error> {
        self.params
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::MissingParam(name.to_string()))
    }

    /// All captured path parameters.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Deserialize the request body as JSON. Trailing NUL bytes are ignored.
    pub fn parse_body<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let body = self.req.body_bytes();
        let end = body.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        Ok(serde_json::from_slice(&body[..end])?)
    }
}
